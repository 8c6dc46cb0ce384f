//! In-memory payload cache storage, keyed by `payload_id` (spec.md §4.4).
//!
//! Backed by `dashmap` for the same reason the teacher's request-routing
//! tables use it: per-shard locking gives concurrent handlers on different
//! files lock-free access to each other, while two handlers racing on the
//! *same* file serialize only as long as they touch the same shard entry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;

use super::state::State;
use crate::context::CancellationToken;
use crate::metadata::PayloadId;

/// One payload's cached bytes and bookkeeping. Bytes are held as a flat
/// buffer rather than a sparse structure: spec.md §3 invariants guarantee
/// `flushed_offset <= cached_size`, and WRITE never creates a hole past
/// the process's own writes without the content store already backing the
/// gap (zero-fill happens at flush time, not in the cache).
struct Entry {
    data: Vec<u8>,
    flushed_offset: u64,
    prefetched_offset: u64,
    state: State,
    prefetch_in_progress: bool,
    notify: Notify,
}

impl Default for Entry {
    fn default() -> Self {
        Entry {
            data: Vec::new(),
            flushed_offset: 0,
            prefetched_offset: 0,
            state: State::None,
            prefetch_in_progress: false,
            notify: Notify::new(),
        }
    }
}

/// Returned by [`wait_for_prefetch_offset`](PayloadCache::wait_for_prefetch_offset)
/// when the request's context cancels before the required offset is
/// populated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cancelled;

/// The per-share payload cache. One instance is shared across every
/// handler invocation for a share (spec.md §5 "shared resources").
#[derive(Clone)]
pub struct PayloadCache {
    entries: Arc<DashMap<PayloadId, Entry>>,
}

impl Default for PayloadCache {
    fn default() -> Self {
        PayloadCache::new()
    }
}

impl PayloadCache {
    pub fn new() -> Self {
        PayloadCache { entries: Arc::new(DashMap::new()) }
    }

    /// Bytes currently held for `id`.
    pub fn size(&self, id: &PayloadId) -> u64 {
        self.entries.get(id).map(|e| e.data.len() as u64).unwrap_or(0)
    }

    /// Serves a read from cached bytes. Returns the number of bytes copied
    /// into `buf`, which may be less than `buf.len()` if the cached region
    /// ends first (EOF within the cache, not necessarily EOF of the file —
    /// the handler is responsible for falling through to the content store
    /// or awaiting prefetch as spec.md §4.6 READ's resolution order
    /// describes).
    pub fn read_at(&self, id: &PayloadId, buf: &mut [u8], offset: u64) -> usize {
        let Some(entry) = self.entries.get(id) else { return 0 };
        let offset = offset as usize;
        if offset >= entry.data.len() {
            return 0;
        }
        let n = buf.len().min(entry.data.len() - offset);
        buf[..n].copy_from_slice(&entry.data[offset..offset + n]);
        n
    }

    /// Buffers a write at `offset`, zero-extending the backing buffer if
    /// `offset` is past the current end. Lazily creates the entry (spec.md
    /// §3 "cache entries are created lazily on first WRITE"). The zero-fill
    /// is only correct for bytes this process never had real content for
    /// (a genuine sparse extension); a caller splicing a write into a
    /// brand-new entry for a payload that already has durable bytes
    /// elsewhere (the content store) is responsible for warming those
    /// bytes in first — this method has no store handle to do it itself.
    /// See `handlers::write::warm_new_entry`.
    pub fn write_at(&self, id: &PayloadId, buf: &[u8], offset: u64) {
        let mut entry = self.entries.entry(id.clone()).or_default();
        let offset = offset as usize;
        let end = offset + buf.len();
        if entry.data.len() < end {
            entry.data.resize(end, 0);
        }
        entry.data[offset..end].copy_from_slice(buf);
        if entry.state == State::None {
            entry.state = State::Buffering;
        } else if entry.state == State::Uploading {
            // A concurrent WRITE while flushing drags the state back
            // (spec.md §4.4 transitions).
            entry.state = State::Buffering;
        }
    }

    pub fn flushed_offset(&self, id: &PayloadId) -> u64 {
        self.entries.get(id).map(|e| e.flushed_offset).unwrap_or(0)
    }

    pub fn set_flushed_offset(&self, id: &PayloadId, v: u64) {
        self.entries.entry(id.clone()).or_default().flushed_offset = v;
    }

    pub fn state(&self, id: &PayloadId) -> State {
        self.entries.get(id).map(|e| e.state).unwrap_or(State::None)
    }

    pub fn set_state(&self, id: &PayloadId, state: State) {
        self.entries.entry(id.clone()).or_default().state = state;
    }

    /// Tries to claim responsibility for prefetching `id`, sizing its
    /// buffer to `file_size` up front. Returns `false` if another task is
    /// already prefetching this payload.
    pub fn start_prefetch(&self, id: &PayloadId, file_size: u64) -> bool {
        let mut entry = self.entries.entry(id.clone()).or_default();
        if entry.prefetch_in_progress {
            return false;
        }
        entry.prefetch_in_progress = true;
        entry.state = State::Prefetching;
        if (entry.data.len() as u64) < file_size {
            entry.data.resize(file_size as usize, 0);
        }
        true
    }

    pub fn set_prefetched_offset(&self, id: &PayloadId, v: u64) {
        let mut entry = self.entries.entry(id.clone()).or_default();
        entry.prefetched_offset = v;
        entry.notify.notify_waiters();
    }

    /// Blocks until `prefetched_offset >= required_off` or `cancellation`
    /// fires first.
    pub async fn wait_for_prefetch_offset(
        &self,
        id: &PayloadId,
        required_off: u64,
        cancellation: &CancellationToken,
    ) -> Result<(), Cancelled> {
        loop {
            let (reached, notified) = {
                let entry = self.entries.entry(id.clone()).or_default();
                (entry.prefetched_offset >= required_off, entry.notify.notified())
            };
            if reached {
                return Ok(());
            }
            tokio::select! {
                _ = notified => {}
                _ = cancellation.cancelled() => return Err(Cancelled),
            }
        }
    }

    /// Declares a prefetch finished, successfully or not. On failure the
    /// state reverts to `None` so the next reader falls through to the
    /// content store directly rather than waiting on a stalled prefetch
    /// forever.
    pub fn complete_prefetch(&self, id: &PayloadId, success: bool) {
        let mut entry = self.entries.entry(id.clone()).or_default();
        entry.prefetch_in_progress = false;
        entry.state = if success { State::Cached } else { State::None };
        entry.notify.notify_waiters();
    }

    /// Drops a payload's cache entry entirely, used when the metadata
    /// service orphans the underlying file (spec.md §4.4 "remove-while-cached").
    pub fn evict(&self, id: &PayloadId) {
        self.entries.remove(id);
    }
}
