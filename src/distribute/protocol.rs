//! Wire framing of one entry bucket, root -> owner.
//!
//! A bucket travels as a [`CountFrame`] followed, only when the count is
//! nonzero, by a [`DataFrames`] triple:
//!
//! | order | tag              | payload                 |
//! |-------|------------------|-------------------------|
//! | 1     | `Tag::EntryCount`| `[count]` (integer)     |
//! | 2     | `Tag::Rows`      | `count` global rows     |
//! | 3     | `Tag::Columns`   | `count` column indices  |
//! | 4     | `Tag::Values`    | `count` values (float)  |
//!
//! Sender and receiver must walk this table in the same order. A zero count is
//! never followed by data frames, so "no data" and "empty transfer" cannot be
//! confused. Breaking the order is a programming error: with a blocking
//! transport it deadlocks or mismatches, it is not something to recover from.

use crate::error::SpmvError;
use crate::matrix::CoordinateEntry;
use crate::parallel::{Comm, Tag};

/// Data frames in the order they are exchanged.
pub const DATA_ORDER: [Tag; 3] = [Tag::Rows, Tag::Columns, Tag::Values];

/// Number of entries in the bucket that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountFrame(pub usize);

impl CountFrame {
    pub fn send<C: Comm>(self, comm: &C, dest: usize) -> Result<(), SpmvError> {
        comm.send_ints(&[self.0 as u64], dest, Tag::EntryCount)?;
        Ok(())
    }

    pub fn recv<C: Comm>(comm: &C, source: usize) -> Result<Self, SpmvError> {
        let mut count = [0u64];
        comm.recv_ints(&mut count, source, Tag::EntryCount)?;
        Ok(CountFrame(wire_to_index(count[0])?))
    }
}

/// Structure-of-arrays form of a non-empty bucket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrames {
    pub rows: Vec<u64>,
    pub columns: Vec<u64>,
    pub values: Vec<f64>,
}

impl DataFrames {
    pub fn from_entries(entries: &[CoordinateEntry]) -> Self {
        let mut frames = DataFrames {
            rows: Vec::with_capacity(entries.len()),
            columns: Vec::with_capacity(entries.len()),
            values: Vec::with_capacity(entries.len()),
        };
        for e in entries {
            frames.rows.push(e.row as u64);
            frames.columns.push(e.column as u64);
            frames.values.push(e.value);
        }
        frames
    }

    pub fn into_entries(self) -> Result<Vec<CoordinateEntry>, SpmvError> {
        self.rows
            .into_iter()
            .zip(self.columns)
            .zip(self.values)
            .map(|((row, column), value)| {
                Ok(CoordinateEntry::new(wire_to_index(row)?, wire_to_index(column)?, value))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn send<C: Comm>(&self, comm: &C, dest: usize) -> Result<(), SpmvError> {
        let [rows, columns, values] = DATA_ORDER;
        comm.send_ints(&self.rows, dest, rows)?;
        comm.send_ints(&self.columns, dest, columns)?;
        comm.send_floats(&self.values, dest, values)?;
        Ok(())
    }

    pub fn recv<C: Comm>(comm: &C, source: usize, count: usize) -> Result<Self, SpmvError> {
        let [rows_tag, columns_tag, values_tag] = DATA_ORDER;
        let mut frames = DataFrames {
            rows: vec![0; count],
            columns: vec![0; count],
            values: vec![0.0; count],
        };
        comm.recv_ints(&mut frames.rows, source, rows_tag)?;
        comm.recv_ints(&mut frames.columns, source, columns_tag)?;
        comm.recv_floats(&mut frames.values, source, values_tag)?;
        Ok(frames)
    }
}

fn wire_to_index(value: u64) -> Result<usize, SpmvError> {
    usize::try_from(value)
        .map_err(|_| SpmvError::Protocol(format!("index {value} does not fit this platform")))
}

/// Send one bucket to `dest`: count frame, then data frames only if nonempty.
pub fn send_bucket<C: Comm>(comm: &C, dest: usize, bucket: &[CoordinateEntry]) -> Result<(), SpmvError> {
    CountFrame(bucket.len()).send(comm, dest)?;
    if !bucket.is_empty() {
        DataFrames::from_entries(bucket).send(comm, dest)?;
    }
    Ok(())
}

/// Receive the bucket `source` addressed to this rank.
pub fn recv_bucket<C: Comm>(comm: &C, source: usize) -> Result<Vec<CoordinateEntry>, SpmvError> {
    let CountFrame(count) = CountFrame::recv(comm, source)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    DataFrames::recv(comm, source, count)?.into_entries()
}
