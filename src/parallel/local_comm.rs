//! In-process communication backend.
//!
//! Every rank is an OS thread of the current process. Messages travel through
//! FIFO mailboxes keyed by `(source, destination, lane)`, so two messages on the
//! same route are always received in the order they were sent, mirroring MPI's
//! non-overtaking rule. Collectives are built on a dedicated lane and rely on
//! every rank issuing them in the same order.
//!
//! A rank that panics aborts the group: peers blocked in a receive return
//! [`CommError::Aborted`]. A rank that returns while a peer still waits on a
//! message it never sent yields [`CommError::PeerDeparted`] on the waiter.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use super::{Comm, Tag};
use crate::error::CommError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lane {
    Tagged(Tag),
    Collective,
}

impl Lane {
    fn tag(self) -> Option<Tag> {
        match self {
            Lane::Tagged(tag) => Some(tag),
            Lane::Collective => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Route {
    source: usize,
    dest: usize,
    lane: Lane,
}

#[derive(Debug)]
enum Payload {
    Ints(Vec<u64>),
    Floats(Vec<f64>),
}

impl Payload {
    fn kind(&self) -> &'static str {
        match self {
            Payload::Ints(_) => u64::KIND,
            Payload::Floats(_) => f64::KIND,
        }
    }
}

/// Element types that can travel through a mailbox.
trait Element: Copy + Default + Send {
    const KIND: &'static str;
    fn into_payload(data: Vec<Self>) -> Payload;
    fn from_payload(payload: Payload) -> Result<Vec<Self>, Payload>;
}

impl Element for u64 {
    const KIND: &'static str = "integer";
    fn into_payload(data: Vec<Self>) -> Payload {
        Payload::Ints(data)
    }
    fn from_payload(payload: Payload) -> Result<Vec<Self>, Payload> {
        match payload {
            Payload::Ints(data) => Ok(data),
            other => Err(other),
        }
    }
}

impl Element for f64 {
    const KIND: &'static str = "float";
    fn into_payload(data: Vec<Self>) -> Payload {
        Payload::Floats(data)
    }
    fn from_payload(payload: Payload) -> Result<Vec<Self>, Payload> {
        match payload {
            Payload::Floats(data) => Ok(data),
            other => Err(other),
        }
    }
}

#[derive(Default)]
struct PostOffice {
    queues: HashMap<Route, VecDeque<Payload>>,
    departed: Vec<bool>,
    aborted: bool,
}

struct Shared {
    office: Mutex<PostOffice>,
    delivered: Condvar,
}

/// Marks a rank as gone when its thread finishes, and aborts the group if it panicked.
struct Departure {
    rank: usize,
    shared: Arc<Shared>,
}

impl Drop for Departure {
    fn drop(&mut self) {
        let mut office = self.shared.office.lock();
        office.departed[self.rank] = true;
        if std::thread::panicking() {
            office.aborted = true;
        }
        drop(office);
        self.shared.delivered.notify_all();
    }
}

/// One rank of an in-process group.
pub struct LocalComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    fn group(size: usize) -> Vec<LocalComm> {
        let shared = Arc::new(Shared {
            office: Mutex::new(PostOffice {
                departed: vec![false; size],
                ..PostOffice::default()
            }),
            delivered: Condvar::new(),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Run `body` once per rank of a `size`-rank group, each on its own thread,
    /// and return the per-rank results in rank order.
    ///
    /// If any rank panics the panic is re-raised here after every thread has finished.
    pub fn run<R, F>(size: usize, body: F) -> Vec<R>
    where
        F: Fn(&LocalComm) -> R + Sync,
        R: Send,
    {
        let body = &body;
        let outcomes: Vec<std::thread::Result<R>> = std::thread::scope(|scope| {
            let handles: Vec<_> = Self::group(size)
                .into_iter()
                .map(|comm| {
                    scope.spawn(move || {
                        let _departure = Departure {
                            rank: comm.rank,
                            shared: Arc::clone(&comm.shared),
                        };
                        body(&comm)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });
        outcomes
            .into_iter()
            .map(|outcome| outcome.unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    }

    fn check_rank(&self, rank: usize) -> Result<(), CommError> {
        if rank < self.size {
            Ok(())
        } else {
            Err(CommError::InvalidRank { rank, size: self.size })
        }
    }

    fn post<T: Element>(&self, dest: usize, lane: Lane, data: Vec<T>) -> Result<(), CommError> {
        self.check_rank(dest)?;
        let mut office = self.shared.office.lock();
        if office.aborted {
            return Err(CommError::Aborted);
        }
        trace!(from = self.rank, to = dest, ?lane, len = data.len(), "post");
        office
            .queues
            .entry(Route { source: self.rank, dest, lane })
            .or_default()
            .push_back(T::into_payload(data));
        drop(office);
        self.shared.delivered.notify_all();
        Ok(())
    }

    fn take<T: Element>(&self, source: usize, lane: Lane) -> Result<Vec<T>, CommError> {
        self.check_rank(source)?;
        let route = Route { source, dest: self.rank, lane };
        let mut office = self.shared.office.lock();
        let payload = loop {
            if let Some(payload) = office.queues.get_mut(&route).and_then(VecDeque::pop_front) {
                break payload;
            }
            if office.aborted {
                return Err(CommError::Aborted);
            }
            if office.departed[source] {
                return Err(CommError::PeerDeparted { rank: source, waiting: self.rank });
            }
            self.shared.delivered.wait(&mut office);
        };
        drop(office);
        T::from_payload(payload).map_err(|found| CommError::PayloadMismatch {
            tag: lane.tag(),
            expected: T::KIND,
            found: found.kind(),
        })
    }

    fn take_exact<T: Element>(&self, buf: &mut [T], source: usize, lane: Lane) -> Result<(), CommError> {
        let data = self.take::<T>(source, lane)?;
        if data.len() != buf.len() {
            return Err(CommError::LengthMismatch {
                tag: lane.tag(),
                expected: buf.len(),
                found: data.len(),
            });
        }
        buf.copy_from_slice(&data);
        Ok(())
    }

    fn broadcast<T: Element>(&self, buf: &mut [T], root: usize) -> Result<(), CommError> {
        self.check_rank(root)?;
        if self.rank == root {
            for dest in (0..self.size).filter(|&r| r != root) {
                self.post(dest, Lane::Collective, buf.to_vec())?;
            }
            Ok(())
        } else {
            self.take_exact(buf, root, Lane::Collective)
        }
    }

    fn gather_varcount<T: Element>(
        &self,
        local: &[T],
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<Vec<T>, CommError> {
        self.check_rank(root)?;
        if self.rank != root {
            self.post(root, Lane::Collective, local.to_vec())?;
            return Ok(Vec::new());
        }
        for layout in [counts.len(), displs.len()] {
            if layout != self.size {
                return Err(CommError::LengthMismatch { tag: None, expected: self.size, found: layout });
            }
        }
        let total = counts.iter().zip(displs).map(|(c, d)| c + d).max().unwrap_or(0);
        let mut out = vec![T::default(); total];
        for source in 0..self.size {
            let segment = &mut out[displs[source]..displs[source] + counts[source]];
            if source == root {
                if local.len() != segment.len() {
                    return Err(CommError::LengthMismatch {
                        tag: None,
                        expected: segment.len(),
                        found: local.len(),
                    });
                }
                segment.copy_from_slice(local);
            } else {
                self.take_exact(segment, source, Lane::Collective)?;
            }
        }
        Ok(out)
    }
}

impl Comm for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.gather_ints(&[], 0)?;
        self.broadcast_ints(&mut [], 0)
    }

    fn broadcast_ints(&self, buf: &mut [u64], root: usize) -> Result<(), CommError> {
        self.broadcast(buf, root)
    }

    fn broadcast_floats(&self, buf: &mut [f64], root: usize) -> Result<(), CommError> {
        self.broadcast(buf, root)
    }

    fn send_ints(&self, data: &[u64], dest: usize, tag: Tag) -> Result<(), CommError> {
        self.post(dest, Lane::Tagged(tag), data.to_vec())
    }

    fn send_floats(&self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError> {
        self.post(dest, Lane::Tagged(tag), data.to_vec())
    }

    fn recv_ints(&self, buf: &mut [u64], source: usize, tag: Tag) -> Result<(), CommError> {
        self.take_exact(buf, source, Lane::Tagged(tag))
    }

    fn recv_floats(&self, buf: &mut [f64], source: usize, tag: Tag) -> Result<(), CommError> {
        self.take_exact(buf, source, Lane::Tagged(tag))
    }

    fn gather_ints(&self, local: &[u64], root: usize) -> Result<Vec<u64>, CommError> {
        let counts = vec![local.len(); self.size];
        let displs: Vec<usize> = (0..self.size).map(|r| r * local.len()).collect();
        self.gather_varcount(local, &counts, &displs, root)
    }

    fn gather_varcount_floats(
        &self,
        local: &[f64],
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<Vec<f64>, CommError> {
        self.gather_varcount(local, counts, displs, root)
    }
}
