use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Position-ordered index of clusters, partitioned by a match key
///
/// The key holds everything which must match exactly between a record and a cluster, such as
/// the chromosome and allele or breakend orientation. Within each key, cluster anchors are
/// stored in position order so that all clusters within a window of a query position can be
/// found without scanning the other clusters on the chromosome.
///
pub struct WindowIndex<K> {
    data: HashMap<K, BTreeMap<i64, Vec<usize>>>,
}

impl<K: Eq + Hash> WindowIndex<K> {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Add a cluster anchored at `pos`
    pub fn insert(&mut self, key: K, pos: i64, cluster_index: usize) {
        self.data
            .entry(key)
            .or_default()
            .entry(pos)
            .or_default()
            .push(cluster_index);
    }

    /// Iterate over all (anchor position, cluster index) entries for `key` with an anchor
    /// position in [pos - window, pos + window]
    ///
    /// Entries are returned in anchor position order, with ties in insertion order.
    ///
    pub fn get_window(&self, key: &K, pos: i64, window: i64) -> impl Iterator<Item = (i64, usize)> {
        let start = pos.saturating_sub(window);
        let end = pos.saturating_add(window);
        self.data.get(key).into_iter().flat_map(move |positions| {
            positions.range(start..=end).flat_map(|(&anchor_pos, cluster_indexes)| {
                cluster_indexes
                    .iter()
                    .map(move |&cluster_index| (anchor_pos, cluster_index))
            })
        })
    }

    /// Total number of indexed clusters
    pub fn len(&self) -> usize {
        self.data.values().flat_map(|x| x.values()).map(|x| x.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_window() {
        let mut index = WindowIndex::new();
        index.insert("chr1", 100, 0);
        index.insert("chr1", 110, 1);
        index.insert("chr1", 121, 2);
        index.insert("chr1", 110, 3);
        index.insert("chr2", 105, 4);
        assert_eq!(index.len(), 5);

        let hits = index.get_window(&"chr1", 110, 10).collect::<Vec<_>>();
        assert_eq!(hits, vec![(100, 0), (110, 1), (110, 3)]);

        let hits = index.get_window(&"chr1", 110, 0).collect::<Vec<_>>();
        assert_eq!(hits, vec![(110, 1), (110, 3)]);

        let hits = index.get_window(&"chr2", 110, 4).collect::<Vec<_>>();
        assert!(hits.is_empty());

        let hits = index.get_window(&"chr3", 110, 1000).collect::<Vec<_>>();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_get_window_extreme_positions() {
        let mut index = WindowIndex::new();
        index.insert(0u8, 0, 0);
        index.insert(0u8, i64::MAX, 1);

        let hits = index.get_window(&0u8, 5, i64::MAX).collect::<Vec<_>>();
        assert_eq!(hits, vec![(0, 0), (i64::MAX, 1)]);
    }
}
