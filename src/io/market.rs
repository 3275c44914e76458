//! Matrix Market coordinate format.
//!
//! Reading is deliberately lenient below the banner: comment and blank lines are
//! skipped anywhere, a size line that does not parse is passed over, and data
//! lines that are short or carry non-positive indices are counted in
//! [`MarketMatrix::skipped_lines`] instead of aborting a large read.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{MarketError, SpmvError};
use crate::matrix::CoordinateEntry;

const BANNER: &str = "%%MatrixMarket";

/// Significant digits used for written values.
pub const OUTPUT_DIGITS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Real,
    Integer,
    /// No value column; every entry is 1.0.
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
    Hermitian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHeader {
    pub field: Field,
    pub symmetry: Symmetry,
}

impl MarketHeader {
    fn parse(line: &str) -> Result<Self, MarketError> {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_ascii_lowercase).collect();
        if !tokens.first().is_some_and(|t| t.eq_ignore_ascii_case(BANNER)) {
            return Err(MarketError::MissingBanner);
        }
        let [_, object, format, field, symmetry] = &tokens[..] else {
            return Err(MarketError::UnsupportedFormat(line.trim().to_string()));
        };
        if object != "matrix" || format != "coordinate" {
            return Err(MarketError::UnsupportedFormat(format!("{object} {format}")));
        }
        let field = match field.as_str() {
            "real" | "double" => Field::Real,
            "integer" => Field::Integer,
            "pattern" => Field::Pattern,
            other => return Err(MarketError::UnsupportedFormat(format!("field {other}"))),
        };
        let symmetry = match symmetry.as_str() {
            "general" => Symmetry::General,
            "symmetric" => Symmetry::Symmetric,
            "skew-symmetric" => Symmetry::SkewSymmetric,
            "hermitian" => Symmetry::Hermitian,
            other => return Err(MarketError::UnsupportedFormat(format!("symmetry {other}"))),
        };
        Ok(MarketHeader { field, symmetry })
    }

    /// Mirror of an off-diagonal entry implied by the symmetry qualifier.
    fn mirror(&self, entry: &CoordinateEntry) -> Option<CoordinateEntry> {
        if entry.row == entry.column {
            return None;
        }
        match self.symmetry {
            Symmetry::General => None,
            Symmetry::Symmetric | Symmetry::Hermitian => {
                Some(CoordinateEntry::new(entry.column, entry.row, entry.value))
            }
            Symmetry::SkewSymmetric => Some(CoordinateEntry::new(entry.column, entry.row, -entry.value)),
        }
    }
}

/// A coordinate file as read: declared shape plus zero-based entries, with
/// symmetric mirrors already expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketMatrix {
    pub header: MarketHeader,
    pub rows: usize,
    pub cols: usize,
    /// nnz declared on the size line (before symmetric expansion).
    pub declared_nnz: usize,
    pub entries: Vec<CoordinateEntry>,
    pub skipped_lines: usize,
}

/// Upper bound on entries reserved up front from the declared nnz.
const MAX_RESERVED_ENTRIES: usize = 1 << 20;

fn is_filler(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('%')
}

fn parse_size(line: &str) -> Option<(usize, usize, usize)> {
    let mut tokens = line.split_whitespace();
    let rows = tokens.next()?.parse().ok()?;
    let cols = tokens.next()?.parse().ok()?;
    let nnz = tokens.next()?.parse().ok()?;
    Some((rows, cols, nnz))
}

fn parse_entry(line: &str, field: Field) -> Option<CoordinateEntry> {
    let mut tokens = line.split_whitespace();
    let row: i64 = tokens.next()?.parse().ok()?;
    let col: i64 = tokens.next()?.parse().ok()?;
    let value = match field {
        Field::Pattern => 1.0,
        Field::Real | Field::Integer => tokens.next()?.parse().ok()?,
    };
    if row < 1 || col < 1 {
        return None;
    }
    Some(CoordinateEntry::new(row as usize - 1, col as usize - 1, value))
}

/// Parse a coordinate file from any buffered reader.
pub fn parse_matrix_market<R: BufRead>(reader: R) -> Result<MarketMatrix, MarketError> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => MarketHeader::parse(&line?)?,
        None => return Err(MarketError::MissingBanner),
    };

    let mut skipped_lines = 0;
    let (rows, cols, declared_nnz) = loop {
        let Some(line) = lines.next() else {
            return Err(MarketError::MissingSize);
        };
        let line = line?;
        if is_filler(&line) {
            continue;
        }
        match parse_size(&line) {
            Some(size) => break size,
            None => skipped_lines += 1,
        }
    };

    // the size line is untrusted input; grow past the cap only as lines arrive
    let mirrored = !matches!(header.symmetry, Symmetry::General);
    let reserve = declared_nnz.min(MAX_RESERVED_ENTRIES);
    let mut entries = Vec::with_capacity(if mirrored { reserve.saturating_mul(2) } else { reserve });
    let mut accepted = 0;
    while accepted < declared_nnz {
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if is_filler(&line) {
            continue;
        }
        let Some(entry) = parse_entry(&line, header.field) else {
            skipped_lines += 1;
            continue;
        };
        if let Some(mirror) = header.mirror(&entry) {
            entries.push(entry);
            entries.push(mirror);
        } else {
            entries.push(entry);
        }
        accepted += 1;
    }
    if accepted < declared_nnz {
        warn!(accepted, declared_nnz, "file ended before all declared entries were read");
    }
    if skipped_lines > 0 {
        warn!(skipped_lines, "skipped malformed lines");
    }

    Ok(MarketMatrix { header, rows, cols, declared_nnz, entries, skipped_lines })
}

/// Read a coordinate file from disk.
pub fn read_matrix_market(path: &Path) -> Result<MarketMatrix, MarketError> {
    let file = File::open(path).map_err(|source| MarketError::Open { path: path.to_path_buf(), source })?;
    let matrix = parse_matrix_market(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        rows = matrix.rows,
        cols = matrix.cols,
        entries = matrix.entries.len(),
        "read matrix market file"
    );
    Ok(matrix)
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Format like C's `%.<digits>g`: shortest of fixed or scientific notation
/// with `digits` significant digits and trailing zeros removed.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.unsigned_abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// Write `values` as an `n x 1` real general coordinate file, keeping only
/// entries with `|v| > tolerance`. Returns the number of entries written.
pub fn write_vector<W: Write>(mut out: W, values: &[f64], tolerance: f64) -> std::io::Result<usize> {
    let nonzeros: Vec<(usize, f64)> = values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.abs() > tolerance)
        .collect();
    writeln!(out, "{BANNER} matrix coordinate real general")?;
    writeln!(out, "{} 1 {}", values.len(), nonzeros.len())?;
    for (i, v) in &nonzeros {
        writeln!(out, "{} 1 {}", i + 1, format_significant(*v, OUTPUT_DIGITS))?;
    }
    out.flush()?;
    Ok(nonzeros.len())
}

/// [`write_vector`] into a file at `path`.
pub fn write_vector_file(path: &Path, values: &[f64], tolerance: f64) -> Result<usize, SpmvError> {
    let wrap = |source| SpmvError::OutputWrite { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(wrap)?;
    write_vector(BufWriter::new(file), values, tolerance).map_err(wrap)
}
