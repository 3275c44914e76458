//! Context module for rowspmv.
//!
//! This module provides the context type that sequences one distributed
//! multiply: validation on the root, broadcast of the outcome and the shapes,
//! row partitioning, entry distribution, local CSR conversion, vector
//! broadcast, local multiply, result gather and output.
//!
//! Modules:
//! - [`spmv_context`]: Contains the `SpmvContext` struct and its `RunSummary`.
//!
//! # Example
//! ```rust,no_run
//! use rowspmv::{LocalComm, SpmvContext, SpmvOptions};
//! let options = SpmvOptions::new("A.mtx", "x.mtx", "y.mtx");
//! let results = LocalComm::run(4, |comm| SpmvContext::new(comm, options.clone()).run());
//! ```

pub mod spmv_context;
pub use spmv_context::{RunSummary, SpmvContext};
