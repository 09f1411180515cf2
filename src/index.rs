/// The interface shared by the colour-descriptor indexes.

use crate::distance::chi_square;
use crate::models::{Record, SearchResult};

pub trait SimilarityIndex
{
    fn insert(&mut self, record: Record);

    /// Returns at most `k` records closest to `query`, nearest first.
    fn query(&self, query: &Record, k: usize) -> Vec<SearchResult>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

/// Scores the candidates by chi-square histogram distance to the query and keeps the `k` nearest.
/// Equal distances are ordered by record id, which is the order the records were inserted in.
pub fn rank_by_histogram<'a, I>(query: &Record, candidates: I, k: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut scored: Vec<(f32, &Record)> = candidates
        .into_iter()
        .map(|record| (chi_square(&query.color.histogram, &record.color.histogram), record))
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));

    scored
        .into_iter()
        .take(k)
        .map(|(distance, record)| SearchResult { path: record.path.clone(), distance })
        .collect()
}
