//! Run configuration.

pub mod options;
pub use options::{DEFAULT_ZERO_TOLERANCE, ROOT_RANK, SpmvOptions};
