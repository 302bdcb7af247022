pub mod stablecoin_snapshots;
