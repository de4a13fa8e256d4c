//! Collection helpers
//!
//! Ordered grouping and keyed set differences. Everything returns `BTreeMap`/sorted
//! output so that results built on top of these helpers are deterministic.

use std::collections::BTreeMap;

/// Index borrowed items by key. Later items with the same key replace earlier ones.
///
/// # Example
/// ```ignore
/// let by_signature = index_by(&operations, OperationSignature::of);
/// ```
#[inline]
pub fn index_by<T, K, F>(items: &[T], key_fn: F) -> BTreeMap<K, &T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.iter().map(|item| (key_fn(item), item)).collect()
}

/// Group borrowed items by an optional key, skipping items without one.
/// Items inside a group keep their input order.
///
/// # Example
/// ```ignore
/// let by_object = group_by_key(&operations, |op| op.object_name.clone());
/// ```
pub fn group_by_key<T, K, F>(items: &[T], key_fn: F) -> BTreeMap<K, Vec<&T>>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut map: BTreeMap<K, Vec<&T>> = BTreeMap::new();
    for item in items {
        if let Some(key) = key_fn(item) {
            map.entry(key).or_default().push(item);
        }
    }
    map
}

/// Keys present only on the left, only on the right, and on both sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiff<K> {
    pub only_left: Vec<K>,
    pub only_right: Vec<K>,
    pub both: Vec<K>,
}

/// Set difference and intersection over the keys of two maps
///
/// # Example
/// ```ignore
/// let diff = diff_keys(&current, &historical);
/// // diff.only_left: added, diff.only_right: removed, diff.both: candidates for modification
/// ```
pub fn diff_keys<K, L, R>(left: &BTreeMap<K, L>, right: &BTreeMap<K, R>) -> KeyDiff<K>
where
    K: Ord + Clone,
{
    let only_left = left.keys().filter(|k| !right.contains_key(*k)).cloned().collect();
    let only_right = right.keys().filter(|k| !left.contains_key(*k)).cloned().collect();
    let both = left.keys().filter(|k| right.contains_key(*k)).cloned().collect();
    KeyDiff { only_left, only_right, both }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_key_skips_missing_and_keeps_order() {
        let items = vec![("a", 1), ("b", 2), ("-", 3), ("a", 4)];
        let grouped = group_by_key(&items, |(k, _)| (*k != "-").then(|| k.to_string()));

        assert_eq!(grouped.len(), 2);
        let a: Vec<i32> = grouped["a"].iter().map(|(_, v)| *v).collect();
        assert_eq!(a, vec![1, 4]);
    }

    #[test]
    fn test_diff_keys() {
        let left = index_by(&[1, 2, 3], |v| *v);
        let right = index_by(&[2, 3, 4], |v| *v);
        let diff = diff_keys(&left, &right);

        assert_eq!(diff.only_left, vec![1]);
        assert_eq!(diff.only_right, vec![4]);
        assert_eq!(diff.both, vec![2, 3]);
    }
}
