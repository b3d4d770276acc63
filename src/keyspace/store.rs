//! Keyspace implementation
//!
//! Two HashMaps, each behind a parking_lot RwLock.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use super::Hash;

/// Owner of the flat and hash stores
#[derive(Debug, Default)]
pub struct Keyspace {
    /// Flat store
    strings: RwLock<HashMap<Bytes, Bytes>>,

    /// Hash store
    hashes: RwLock<HashMap<Bytes, Hash>>,
}

impl Keyspace {
    /// Create an empty keyspace
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Flat store
    // =========================================================================

    /// Insert or overwrite a key
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.strings.write().insert(key, value);
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.strings.read().get(key).cloned()
    }

    // =========================================================================
    // Hash store
    // =========================================================================

    /// Insert or overwrite a field, creating the hash if needed
    pub fn hset(&self, hash: Bytes, field: Bytes, value: Bytes) {
        self.hashes
            .write()
            .entry(hash)
            .or_default()
            .insert(field, value);
    }

    pub fn hget(&self, hash: &[u8], field: &[u8]) -> Option<Bytes> {
        self.hashes
            .read()
            .get(hash)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    /// All field/value pairs of a hash, in no particular order.
    /// `None` if the hash does not exist.
    pub fn hgetall(&self, hash: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        self.hashes.read().get(hash).map(|fields| {
            fields
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect()
        })
    }

    /// Number of fields in a hash, 0 if absent
    pub fn hlen(&self, hash: &[u8]) -> usize {
        self.hashes.read().get(hash).map_or(0, |fields| fields.len())
    }

    /// Remove fields from a hash and return how many existed.
    /// Drops the hash once it has no fields left.
    pub fn hdel(&self, hash: &[u8], fields: &[Bytes]) -> usize {
        let mut hashes = self.hashes.write();
        let Some(map) = hashes.get_mut(hash) else {
            return 0;
        };

        let removed = fields
            .iter()
            .filter(|field| map.remove(&field[..]).is_some())
            .count();

        if map.is_empty() {
            hashes.remove(hash);
        }
        removed
    }

    pub fn hexists(&self, hash: &[u8], field: &[u8]) -> bool {
        self.hashes
            .read()
            .get(hash)
            .is_some_and(|fields| fields.contains_key(field))
    }

    // =========================================================================
    // Both stores
    // =========================================================================

    /// Remove keys from both stores.
    ///
    /// Each store counts separately: a name present as a flat key and as a
    /// hash contributes 2.
    pub fn del(&self, keys: &[Bytes]) -> usize {
        let mut strings = self.strings.write();
        let mut hashes = self.hashes.write();

        let mut removed = 0;
        for key in keys {
            if strings.remove(&key[..]).is_some() {
                removed += 1;
            }
            if hashes.remove(&key[..]).is_some() {
                removed += 1;
            }
        }

        drop(hashes);
        drop(strings);
        removed
    }

    /// Whether the name exists in either store
    pub fn exists(&self, key: &[u8]) -> bool {
        let strings = self.strings.read();
        let hashes = self.hashes.read();

        let found = strings.contains_key(key) || hashes.contains_key(key);

        drop(hashes);
        drop(strings);
        found
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of keys in the flat store
    pub fn string_count(&self) -> usize {
        self.strings.read().len()
    }

    /// Number of hashes in the hash store
    pub fn hash_count(&self) -> usize {
        self.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.string_count() == 0 && self.hash_count() == 0
    }
}
