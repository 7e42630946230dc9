use parking_lot::Mutex;
use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::{BuildHasher, Hash},
};
use triomphe::Arc as TrioArc;

use super::entry::Entry;

/// The result of looking a key up in the table.
pub(crate) enum Lookup<V, E> {
    /// The key was absent; a new pending entry was inserted and the caller now
    /// owns its computation.
    Inserted(TrioArc<Entry<V, E>>),
    /// The key's entry exists and is still being computed.
    Pending(TrioArc<Entry<V, E>>),
    /// The key's entry exists and its outcome has been published.
    Ready(TrioArc<Entry<V, E>>),
}

/// Map from keys to their entries, guarded by a single mutex.
///
/// The mutex protects only the map itself. It is held for one lookup or
/// insertion and released before any computation runs. Entries are never
/// removed or replaced.
pub(crate) struct EntryTable<K, V, E, S> {
    entries: Mutex<HashMap<K, TrioArc<Entry<V, E>>, S>>,
}

impl<K, V, E, S> EntryTable<K, V, E, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity_and_hasher(capacity, hasher)),
        }
    }

    /// Returns the key's entry, inserting a pending one if the key is absent.
    pub(crate) fn get_or_insert<Q>(&self, key: &Q) -> Lookup<V, E>
    where
        K: Borrow<Q>,
        Q: ToOwned<Owned = K> + Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            let entry = TrioArc::clone(entry);
            return if entry.is_ready() {
                Lookup::Ready(entry)
            } else {
                Lookup::Pending(entry)
            };
        }

        let entry = TrioArc::new(Entry::new());
        entries.insert(key.to_owned(), TrioArc::clone(&entry));
        Lookup::Inserted(entry)
    }

    /// Returns the key's entry without inserting anything.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<TrioArc<Entry<V, E>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.lock().get(key).map(TrioArc::clone)
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.lock().contains_key(key)
    }
}

impl<K, V, E, S> EntryTable<K, V, E, S> {
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
