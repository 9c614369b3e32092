//! Query execution and result shaping for sqlrun.
//!
//! Rows flow forward through normalization, projection and serialization;
//! the containment policy decides what a failure anywhere in that chain
//! turns into.

pub mod containment;
pub mod executor;
pub mod normalize;
pub mod projection;
pub mod serialize;

pub use containment::{ContainmentPolicy, ExecutionOutcome};
pub use executor::SqlExecutor;
pub use projection::ProjectedRow;
