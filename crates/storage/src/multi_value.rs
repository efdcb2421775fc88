//! Versioned value chains
//!
//! Each key in the store maps to a `MultiValue`: the values the key held at
//! each commit version that is still reachable by a live snapshot or
//! transaction. Versions strictly ascend within a chain. Chains are never
//! mutated in place; `append` and `compact` return new chains which the
//! caller publishes with a compare-and-swap.

/// A single versioned value
///
/// A tombstone (`deleted = true`) records a logical deletion at its
/// version; its `data` is empty. Inside a transaction's workspace the
/// version field is the transaction's draft version; the commit path
/// rewrites it to the allocated commit version before the value reaches a
/// published chain, so the store never holds a draft version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Commit version (or draft version inside a transaction workspace)
    pub version: u64,
    /// The value bytes; empty for tombstones
    pub data: Vec<u8>,
    /// True if this value records a deletion
    pub deleted: bool,
}

impl Value {
    /// Create a live value
    pub fn live(version: u64, data: Vec<u8>) -> Self {
        Value {
            version,
            data,
            deleted: false,
        }
    }

    /// Create a tombstone
    pub fn tombstone(version: u64) -> Self {
        Value {
            version,
            data: Vec::new(),
            deleted: true,
        }
    }
}

/// Ordered chain of versioned values for one key
///
/// Values are kept oldest-first with strictly ascending versions, which
/// makes "largest version at or below V" a binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValue {
    values: Vec<Value>,
}

impl MultiValue {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain holding a single value
    pub fn single(value: Value) -> Self {
        MultiValue {
            values: vec![value],
        }
    }

    /// Get the value visible at `version`: the entry with the largest
    /// version at or below it
    ///
    /// Returns `None` when every entry in the chain is newer than
    /// `version`, or the chain is empty. A tombstone is returned like any
    /// other value; visibility of deletions is the caller's concern.
    pub fn fetch(&self, version: u64) -> Option<&Value> {
        match self.values.binary_search_by(|v| v.version.cmp(&version)) {
            Ok(index) => Some(&self.values[index]),
            Err(0) => None,
            Err(index) => Some(&self.values[index - 1]),
        }
    }

    /// Get the newest value in the chain
    pub fn latest(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Return a new chain with `value` appended
    ///
    /// # Panics
    ///
    /// Panics if `value.version` is not strictly greater than every version
    /// already in the chain. Appends happen only under the commit mutex,
    /// which allocates monotonically increasing commit versions; an
    /// out-of-order append means the store is corrupt.
    #[must_use]
    pub fn append(&self, value: Value) -> MultiValue {
        if let Some(last) = self.values.last() {
            assert!(
                value.version > last.version,
                "append version {} is not above chain head {}",
                value.version,
                last.version,
            );
        }
        let mut values = Vec::with_capacity(self.values.len() + 1);
        values.extend_from_slice(&self.values);
        values.push(value);
        MultiValue { values }
    }

    /// Drop values below the newest version at or below `min_version`
    ///
    /// The entry visible at `min_version` survives, so every snapshot
    /// pinned at or above the minimum pin can still resolve its view.
    /// Returns `None` when nothing is removable and the existing chain
    /// should be kept as-is.
    #[must_use]
    pub fn compact(&self, min_version: u64) -> Option<MultiValue> {
        if self.values.len() <= 1 {
            return None;
        }
        let keep_from = match self.values.binary_search_by(|v| v.version.cmp(&min_version)) {
            Ok(index) => index,
            Err(0) => return None,
            Err(index) => index - 1,
        };
        if keep_from == 0 {
            return None;
        }
        Some(MultiValue {
            values: self.values[keep_from..].to_vec(),
        })
    }

    /// True when the chain holds no values, or only tombstones
    ///
    /// An all-tombstone chain is eligible for removal from the store once
    /// compaction has discarded everything below the minimum pin.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.deleted)
    }

    /// Number of retained versions
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// All retained values, oldest first
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(versions: &[u64]) -> MultiValue {
        let mut mv = MultiValue::new();
        for &v in versions {
            mv = mv.append(Value::live(v, format!("v{v}").into_bytes()));
        }
        mv
    }

    #[test]
    fn test_fetch_exact_version() {
        let mv = chain(&[2, 5, 9]);
        assert_eq!(mv.fetch(5).unwrap().version, 5);
    }

    #[test]
    fn test_fetch_closest_lower_version() {
        let mv = chain(&[2, 5, 9]);
        assert_eq!(mv.fetch(7).unwrap().version, 5);
        assert_eq!(mv.fetch(100).unwrap().version, 9);
        assert_eq!(mv.fetch(u64::MAX).unwrap().version, 9);
    }

    #[test]
    fn test_fetch_below_oldest() {
        let mv = chain(&[2, 5]);
        assert!(mv.fetch(1).is_none());
    }

    #[test]
    fn test_fetch_empty_chain() {
        assert!(MultiValue::new().fetch(10).is_none());
    }

    #[test]
    fn test_append_preserves_existing() {
        let mv = chain(&[1]);
        let mv2 = mv.append(Value::live(2, b"two".to_vec()));
        // Old chain untouched; new chain extended.
        assert_eq!(mv.len(), 1);
        assert_eq!(mv2.len(), 2);
        assert_eq!(mv2.fetch(2).unwrap().data, b"two");
    }

    #[test]
    #[should_panic(expected = "not above chain head")]
    fn test_append_out_of_order_panics() {
        let mv = chain(&[5]);
        let _ = mv.append(Value::live(5, vec![]));
    }

    #[test]
    fn test_compact_keeps_visible_value() {
        let mv = chain(&[2, 5, 9]);
        let compacted = mv.compact(7).unwrap();
        // Version 5 is visible at min 7; version 2 goes.
        assert_eq!(compacted.len(), 2);
        assert_eq!(compacted.fetch(7).unwrap().version, 5);
        assert_eq!(compacted.fetch(u64::MAX).unwrap().version, 9);
    }

    #[test]
    fn test_compact_nothing_to_remove() {
        let mv = chain(&[2, 5]);
        // Min below the oldest version: nothing removable.
        assert!(mv.compact(1).is_none());
        // Min exactly at the oldest version: it stays visible.
        assert!(mv.compact(2).is_none());
    }

    #[test]
    fn test_compact_single_value_chain() {
        let mv = chain(&[3]);
        assert!(mv.compact(u64::MAX).is_none());
    }

    #[test]
    fn test_compact_to_latest() {
        let mv = chain(&[2, 5, 9]);
        let compacted = mv.compact(u64::MAX).unwrap();
        assert_eq!(compacted.len(), 1);
        assert_eq!(compacted.latest().unwrap().version, 9);
    }

    #[test]
    fn test_is_empty() {
        assert!(MultiValue::new().is_empty());
        assert!(!chain(&[1]).is_empty());

        let tombs = MultiValue::single(Value::tombstone(1)).append(Value::tombstone(4));
        assert!(tombs.is_empty());

        let mixed = MultiValue::single(Value::live(1, vec![1])).append(Value::tombstone(4));
        assert!(!mixed.is_empty());
    }

    #[test]
    fn test_versions_strictly_ascend() {
        let mv = chain(&[1, 3, 8]);
        let versions: Vec<u64> = mv.values().iter().map(|v| v.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }
}
