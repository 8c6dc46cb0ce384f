//! Capability-erased handle to a content store (spec.md §4.5).
//!
//! A concrete store implements [`ContentStore`] and, optionally,
//! [`RandomReadable`] and/or [`IncrementalWritable`]. [`ContentStoreHandle`]
//! lets the handler layer hold one reference and probe for the optional
//! capabilities once, at construction time, rather than downcasting on
//! every call.

use std::sync::Arc;

use super::{ContentStore, IncrementalWritable, RandomReadable};

#[derive(Clone)]
pub struct ContentStoreHandle {
    pub base: Arc<dyn ContentStore>,
    pub random_read: Option<Arc<dyn RandomReadable>>,
    pub incremental_write: Option<Arc<dyn IncrementalWritable>>,
}

impl ContentStoreHandle {
    /// Wraps a store offering only the mandatory capability.
    pub fn basic<T: ContentStore + 'static>(store: Arc<T>) -> Self {
        ContentStoreHandle { base: store, random_read: None, incremental_write: None }
    }

    /// Wraps a store that additionally supports random-access reads.
    pub fn with_random_read<T: ContentStore + RandomReadable + 'static>(store: Arc<T>) -> Self {
        ContentStoreHandle {
            random_read: Some(store.clone()),
            incremental_write: None,
            base: store,
        }
    }

    /// Wraps a store supporting both optional capabilities.
    pub fn full<T: ContentStore + RandomReadable + IncrementalWritable + 'static>(
        store: Arc<T>,
    ) -> Self {
        ContentStoreHandle {
            random_read: Some(store.clone()),
            incremental_write: Some(store.clone()),
            base: store,
        }
    }
}
