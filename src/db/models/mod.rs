mod chain_circulation;
mod stablecoin_snapshot;

pub use chain_circulation::ChainCirculation;
pub use stablecoin_snapshot::StablecoinSnapshot;
