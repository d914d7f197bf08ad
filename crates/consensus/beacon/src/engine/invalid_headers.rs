use ember_primitives::{Header, SealedHeader, B256};
use schnellru::{ByLength, LruMap};
use tracing::warn;

/// The maximum number of invalid headers the engine keeps track of.
const DEFAULT_MAX_INVALID_HEADERS: u32 = 512;

/// Keeps track of headers the engine rejected as invalid, so descendants of
/// a known-bad block can be answered without re-executing anything.
///
/// An entry maps a block hash to the header of its closest invalid ancestor
/// (the block itself, if it was the one that failed validation).
#[derive(Debug)]
pub struct InvalidHeaderCache {
    headers: LruMap<B256, Header>,
}

impl InvalidHeaderCache {
    /// Creates a cache bounded to the given number of entries.
    pub fn new(max_length: u32) -> Self {
        Self { headers: LruMap::new(ByLength::new(max_length)) }
    }

    /// Returns the invalid ancestor's header recorded for the hash, if any.
    pub fn get(&mut self, hash: &B256) -> Option<&Header> {
        self.headers.get(hash).map(|header| &*header)
    }

    /// Inserts a header this engine has proven invalid.
    pub fn insert(&mut self, invalid: SealedHeader) {
        let (header, hash) = invalid.split();
        warn!(target: "consensus::engine", ?hash, number = header.number, "recording invalid header");
        self.headers.insert(hash, header);
    }

    /// Records that `descendant` links to the already known invalid
    /// `ancestor`.
    pub fn insert_with_invalid_ancestor(&mut self, descendant: B256, ancestor: Header) {
        self.headers.insert(descendant, ancestor);
    }
}

impl Default for InvalidHeaderCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INVALID_HEADERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendants_resolve_to_the_ancestor() {
        let mut cache = InvalidHeaderCache::new(16);
        let bad = Header { number: 5, ..Default::default() }.seal_slow();
        let bad_header = bad.header().clone();
        cache.insert(bad.clone());

        let child = B256::with_last_byte(0xaa);
        cache.insert_with_invalid_ancestor(child, bad_header.clone());

        assert_eq!(cache.get(&bad.hash()), Some(&bad_header));
        assert_eq!(cache.get(&child), Some(&bad_header));
        assert!(cache.get(&B256::with_last_byte(1)).is_none());
    }
}
