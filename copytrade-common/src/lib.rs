// copytrade-common - shared data model and display rules

pub mod data;
pub mod format;

pub use data::types::*;
