use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::frame::{FilterTag, MasterFrame};

type Slot = Arc<Mutex<Option<Arc<MasterFrame>>>>;

/// Run-scoped store of master frames keyed by filter tag.
///
/// Each tag is built at most once: the first request runs the builder while
/// holding that tag's slot, so concurrent requests for the same tag wait for
/// the in-flight build instead of repeating it. Requests for other tags are
/// not blocked. Entries are never evicted.
#[derive(Default)]
pub struct MasterCache {
    slots: Mutex<HashMap<FilterTag, Slot>>,
}

impl MasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the master for `filter`, building it with `build` on first use.
    ///
    /// A failed build stores nothing, so the error reaches the caller and a
    /// later request may try again.
    pub fn get_or_build<F>(&self, filter: &FilterTag, build: F) -> Result<Arc<MasterFrame>>
    where
        F: FnOnce() -> Result<MasterFrame>,
    {
        let slot = {
            let mut slots = lock(&self.slots);
            slots.entry(filter.clone()).or_default().clone()
        };

        let mut entry = lock(&slot);
        if let Some(master) = entry.as_ref() {
            debug!(filter = %filter, "Reusing cached master");
            return Ok(Arc::clone(master));
        }

        let master = Arc::new(build()?);
        debug!(filter = %filter, samples = master.sample_count, "Cached new master");
        *entry = Some(Arc::clone(&master));
        Ok(master)
    }

    /// The cached master for `filter`, if one has been built.
    pub fn get(&self, filter: &FilterTag) -> Option<Arc<MasterFrame>> {
        let slot = lock(&self.slots).get(filter).cloned()?;
        let entry = lock(&slot);
        entry.clone()
    }

    /// Filter tags with a built master, sorted.
    pub fn filters(&self) -> Vec<FilterTag> {
        let slots: Vec<(FilterTag, Slot)> = lock(&self.slots)
            .iter()
            .map(|(tag, slot)| (tag.clone(), Arc::clone(slot)))
            .collect();
        let mut built: Vec<FilterTag> = slots
            .into_iter()
            .filter(|(_, slot)| lock(slot).is_some())
            .map(|(tag, _)| tag)
            .collect();
        built.sort();
        built
    }

    pub fn len(&self) -> usize {
        self.filters().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A panic inside a builder leaves the slot empty, which is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
