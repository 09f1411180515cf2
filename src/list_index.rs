use crate::index::{rank_by_histogram, SimilarityIndex};
use crate::models::{Record, SearchResult};

/// Exhaustive search: every stored record is scored against the query.
#[derive(Debug, Default)]
pub struct ListIndex
{
    records: Vec<Record>,
}

impl ListIndex
{
    pub fn new() -> ListIndex
    {
        ListIndex::default()
    }
}

impl SimilarityIndex for ListIndex
{
    fn insert(&mut self, record: Record)
    {
        self.records.push(record);
    }

    fn query(&self, query: &Record, k: usize) -> Vec<SearchResult>
    {
        rank_by_histogram(query, &self.records, k)
    }

    fn len(&self) -> usize
    {
        self.records.len()
    }
}
