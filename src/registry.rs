//! Per-thread buffer registry
//!
//! One `ThreadRegistry` exists per registered group. It hands each writer
//! thread its own `RotatingCell`, created lazily on the thread's first record
//! into the group, and lets the collector walk every live cell.
//!
//! # Design
//!
//! - Registries get a process-unique id; a thread-local map keyed by that id
//!   caches the calling thread's cell, so the hot path is one TLS lookup.
//! - The registry owns the cells (strong refs); the thread-local cache holds
//!   weak refs. A thread that exits leaves its cell behind with its final
//!   counts intact: the next gather merges them, and the cell lives until
//!   the group is torn down. Nothing is dropped silently.
//! - `for_each_thread` snapshots the cell list under the registry lock, so
//!   the set of visited threads is consistent for one gather even while new
//!   threads are registering.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::block::{BlockShape, RotatingCell};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// This thread's cell per registry, keyed by registry id. Weak refs so a
    /// torn-down group's cells don't outlive the group through idle threads.
    static LOCAL_CELLS: RefCell<HashMap<u64, Weak<RotatingCell>>> =
        RefCell::new(HashMap::new());
}

/// Registry of per-thread rotating cells for one group.
#[derive(Debug)]
pub(crate) struct ThreadRegistry {
    id: u64,
    shape: BlockShape,
    cells: Mutex<Vec<Arc<RotatingCell>>>,
}

impl ThreadRegistry {
    pub fn new(shape: BlockShape) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            shape,
            cells: Mutex::new(Vec::new()),
        }
    }

    /// The calling thread's cell, created and registered on first use.
    pub fn local_cell(&self) -> Arc<RotatingCell> {
        LOCAL_CELLS.with(|cache| {
            let mut cache = cache.borrow_mut();
            if let Some(cell) = cache.get(&self.id).and_then(Weak::upgrade) {
                return cell;
            }

            let cell = Arc::new(RotatingCell::new(self.shape));
            self.cells.lock().push(Arc::clone(&cell));
            cache.insert(self.id, Arc::downgrade(&cell));
            tracing::debug!(registry = self.id, "registered thread metrics buffer");
            cell
        })
    }

    /// Visit every live per-thread cell.
    ///
    /// The visited set is the one registered at the moment the call starts;
    /// ordering across threads is unspecified.
    pub fn for_each_thread(&self, mut visit: impl FnMut(&RotatingCell)) {
        let cells: Vec<_> = self.cells.lock().clone();
        for cell in &cells {
            visit(cell);
        }
    }

    /// Number of threads that have recorded into this registry
    #[cfg(test)]
    pub fn thread_count(&self) -> usize {
        self.cells.lock().len()
    }
}
