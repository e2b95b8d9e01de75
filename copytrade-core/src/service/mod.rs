pub mod baas;
pub mod errors;

pub use baas::{BaasClient, Page};
pub use errors::ServiceError;
