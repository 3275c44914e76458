//! Matrix module: coordinate entries, CSR storage, format conversion and the
//! local multiply engine.

pub mod convert;
pub mod coo;
pub mod sparse;
pub mod vector;

pub use convert::{to_csr, to_csr_windowed};
pub use coo::CoordinateEntry;
pub use sparse::CsrMatrix;
pub use vector::{VectorShape, dense_vector_from_entries};
