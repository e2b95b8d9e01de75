// chain/mod.rs

pub mod abi;
pub mod errors;
pub mod vault;

pub use errors::ChainError;
pub use vault::{RpcVaultReader, VaultReader};
