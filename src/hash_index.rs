use rustc_hash::FxHashMap;

use crate::color::HashKey;
use crate::index::{rank_by_histogram, SimilarityIndex};
use crate::models::{Record, SearchResult};

/// Buckets records by the coarse colour key of their descriptor.
/// A query ranks its own bucket; when that bucket holds fewer than `k` records,
/// other buckets are borrowed (in key order) until there are at least `2k` candidates.
#[derive(Debug, Default)]
pub struct HashIndex
{
    table: FxHashMap<HashKey, Vec<Record>>,
    len: usize,
}

impl HashIndex
{
    pub fn new() -> HashIndex
    {
        HashIndex::default()
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize
    {
        self.table.len()
    }

    fn candidates(&self, key: HashKey, k: usize) -> Vec<&Record>
    {
        let mut candidates: Vec<&Record> = match self.table.get(&key) {
            Some(bucket) => bucket.iter().collect(),
            None => Vec::new(),
        };

        if candidates.len() < k {
            let mut other_keys: Vec<&HashKey> = self.table.keys().filter(|other| **other != key).collect();
            other_keys.sort();

            for other in other_keys {
                candidates.extend(self.table[other].iter());
                if candidates.len() >= k * 2 {
                    break;
                }
            }
        }

        candidates
    }
}

impl SimilarityIndex for HashIndex
{
    fn insert(&mut self, record: Record)
    {
        let key = record.color.hash_key();
        self.table.entry(key).or_default().push(record);
        self.len += 1;
    }

    fn query(&self, query: &Record, k: usize) -> Vec<SearchResult>
    {
        let candidates = self.candidates(query.color.hash_key(), k);
        rank_by_histogram(query, candidates, k)
    }

    fn len(&self) -> usize
    {
        self.len
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::index::test_support::{solid_record, two_tone_record};

    #[test]
    fn records_with_the_same_key_share_a_bucket()
    {
        let mut index = HashIndex::new();
        index.insert(solid_record(1, "blue", [0, 0, 255]));
        index.insert(solid_record(2, "also_blue", [10, 10, 250]));
        index.insert(solid_record(3, "grey", [128, 128, 128]));

        assert_eq!(index.len(), 3);
        assert_eq!(index.bucket_count(), 2);
    }

    #[test]
    fn full_bucket_is_not_extended()
    {
        let mut index = HashIndex::new();
        index.insert(solid_record(1, "blue", [0, 0, 255]));
        index.insert(two_tone_record(2, "blue_and_red", [0, 0, 255], [255, 0, 0], 0.6));
        index.insert(solid_record(3, "red", [255, 0, 0]));

        let query = solid_record(0, "query", [0, 0, 250]);
        let results = index.query(&query, 2);
        let names: Vec<_> = results.iter().map(|r| r.path.to_str().unwrap()).collect();
        assert_eq!(names, vec!["blue", "blue_and_red"]);
    }

    #[test]
    fn small_bucket_borrows_from_other_buckets()
    {
        let mut index = HashIndex::new();
        index.insert(solid_record(1, "blue", [0, 0, 255]));
        index.insert(solid_record(2, "grey", [128, 128, 128]));
        index.insert(solid_record(3, "black", [0, 0, 0]));
        index.insert(solid_record(4, "white", [255, 255, 255]));

        let query = solid_record(0, "query", [0, 0, 250]);
        let results = index.query(&query, 3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].path.to_str().unwrap(), "blue");
        assert_eq!(results[0].distance, 0.0);
    }

    #[test]
    fn query_against_an_empty_index()
    {
        let index = HashIndex::new();
        assert!(index.query(&solid_record(0, "query", [1, 1, 1]), 3).is_empty());
    }

    #[test]
    fn borrowing_stops_once_twice_k_candidates_are_gathered()
    {
        let mut index = HashIndex::new();
        let hues = [[255, 0, 0], [255, 255, 0], [0, 255, 0], [0, 255, 255], [0, 0, 255], [255, 0, 255]];
        for (id, rgb) in hues.iter().enumerate() {
            index.insert(solid_record(id + 1, &format!("hue_{}", id), *rgb));
        }
        assert_eq!(index.bucket_count(), 6);

        // Grey falls in a bucket of its own.
        let key = solid_record(0, "query", [128, 128, 128]).color.hash_key();
        assert_eq!(index.candidates(key, 1).len(), 2);
        assert_eq!(index.candidates(key, 2).len(), 4);
        assert_eq!(index.candidates(key, 3).len(), 6);
        assert_eq!(index.candidates(key, 5).len(), 6);

        index.insert(solid_record(7, "grey", [128, 128, 128]));
        let candidates = index.candidates(key, 2);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].id, 7);
    }
}
