//! File boundary: Matrix Market coordinate reader and vector writer.

pub mod market;

pub use market::{
    Field, MarketHeader, MarketMatrix, Symmetry, format_significant, parse_matrix_market,
    read_matrix_market, write_vector, write_vector_file,
};
