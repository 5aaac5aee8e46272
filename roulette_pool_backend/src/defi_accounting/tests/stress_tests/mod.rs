mod generators;
mod operations;

pub use model::SystemHarness;
pub use operations::{OpResult, Operation};
