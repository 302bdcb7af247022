//! Ingestion from the stablecoin data provider.
//!
//! One request in flight per endpoint per call; responses are handed to
//! [`crate::processor`] fully materialized.

mod llama;

pub use llama::LlamaClient;
