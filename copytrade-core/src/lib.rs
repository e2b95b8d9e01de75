// copytrade-core - real-time client, wallet and platform read surfaces

pub mod chain;
pub mod config;
pub mod display;
pub mod realtime;
pub mod service;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export copytrade-common for convenience
pub use copytrade_common::{data, format};
