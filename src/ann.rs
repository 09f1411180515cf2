/// Approximate nearest neighbor search using the HNSW algorithm.
/// This module is a wrapper around the hnsw_rs crate that provides a more
/// convenient API for our use case, setting defaults and taking care of
/// configuration for the caller, and logging as necessary.
///
/// It indexes ResNet50 descriptors (see ResNet::describe()) under Euclidean
/// distance, so the distances it reports are directly comparable with
/// distance::euclidean().

use std::path::PathBuf;

use hnsw_rs::{hnsw::Hnsw, prelude::DistL2};
use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::models::SearchResult;

// The maximum number of links from one point to others.
// Values from 16 to 64 are standard, with higher being more time consuming.
pub const DEFAULT_MAX_NB_CONNECTION: usize = 64;
// The maximum number of layers in graph
// Must be less than or equal to 16.
pub const DEFAULT_NB_LAYER: usize = 16;
// This parameter controls the width of the search for neighbours during insertion.
// Values from 400 to 800 are standard, with higher being more time consuming.
pub const DEFAULT_EF_CONSTRUCTION: usize = 400;
pub const DEFAULT_MAX_ELEMS: usize = 10000;

#[derive(Debug, Clone)]
pub struct HnswElement {
    pub feature_vector: Vec<f32>,
    pub path: PathBuf,
}

/// HNSW does not support removing points; the index is built once per search
/// from the images in the scanned directory and dropped afterwards.
pub struct AnnIndex<'a> {
    hnsw: Hnsw<'a, f32, DistL2>,
    /// The hnsw crate uses usize for the ID of the elements in the index.
    /// We map these back to the image paths.
    hnsw_id_to_path_map: FxHashMap<usize, PathBuf>,
    /// Length of the indexed descriptors, once known.
    dimension: Option<usize>,
    current_id: usize,
}

impl<'a> AnnIndex<'a>
{
    /// The descriptor length is taken from the first inserted element.
    pub fn new() -> AnnIndex<'a>
    {
        let hnsw = Hnsw::<f32, DistL2>::new(
            DEFAULT_MAX_NB_CONNECTION,
            DEFAULT_MAX_ELEMS,
            DEFAULT_NB_LAYER,
            DEFAULT_EF_CONSTRUCTION,
            DistL2 {}
            );
        AnnIndex
        {
            hnsw,
            hnsw_id_to_path_map: FxHashMap::default(),
            dimension: None,
            current_id: 0,
        }
    }

    pub fn insert(&mut self, element: HnswElement) -> Result<()>
    {
        let dimension = *self.dimension.get_or_insert(element.feature_vector.len());
        if element.feature_vector.len() != dimension {
            return Err(Error::DimensionMismatch(dimension, element.feature_vector.len()));
        }
        let id = self.current_id;
        self.current_id += 1;
        self.hnsw.insert_slice((&element.feature_vector[..], id));
        self.hnsw_id_to_path_map.insert(id, element.path);
        Ok(())
    }

    pub fn len(&self) -> usize
    {
        self.hnsw_id_to_path_map.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.hnsw_id_to_path_map.is_empty()
    }

    /// Returns up to `knbn` nearest neighbours with their Euclidean distances, nearest first.
    ///
    /// @param ef_arg controls the width of the search in the lowest level.
    /// It is raised to `knbn` when smaller. Recall is lower if ef_arg is lower, but search is slower with high ef_arg.
    pub fn search(&self, query: &[f32], knbn: usize, ef_arg: usize) -> Result<Vec<SearchResult>>
    {
        let Some(dimension) = self.dimension else {
            return Ok(vec![]);
        };
        if query.len() != dimension {
            return Err(Error::DimensionMismatch(dimension, query.len()));
        }
        if self.is_empty() || knbn == 0 {
            return Ok(vec![]);
        }

        let ef_arg = ef_arg.max(knbn);
        let now = std::time::Instant::now();
        let knn_neighbours = self.hnsw.search(query, knbn, ef_arg);
        debug!("HNSW search took {:?} for {:?} neighbors with ef_arg {:?}", now.elapsed(), knbn, ef_arg);

        // Neighbour.d_id (short for data_id) corresponds to the usize ID.
        let mut results: Vec<SearchResult> = knn_neighbours
            .iter()
            .filter_map(|n| {
                self.hnsw_id_to_path_map
                    .get(&n.d_id)
                    .map(|path| SearchResult { path: path.clone(), distance: n.distance })
            })
            .collect();
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(knbn);
        Ok(results)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_abs_diff_eq;

    fn element(name: &str, values: [f32; 4]) -> HnswElement
    {
        HnswElement { feature_vector: values.to_vec(), path: PathBuf::from(name) }
    }

    #[test]
    fn finds_the_nearest_descriptors()
    {
        let mut index = AnnIndex::new();
        index.insert(element("a", [0.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(element("b", [1.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(element("c", [10.0, 10.0, 10.0, 10.0])).unwrap();
        index.insert(element("d", [0.0, 3.0, 4.0, 0.0])).unwrap();
        assert_eq!(index.len(), 4);

        let results = index.search(&[0.9, 0.0, 0.0, 0.0], 2, 16).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].path, PathBuf::from("b"));
        assert_abs_diff_eq!(results[0].distance, 0.1, epsilon = 1e-5);
        assert_eq!(results[1].path, PathBuf::from("a"));
        assert_abs_diff_eq!(results[1].distance, 0.9, epsilon = 1e-5);
    }

    #[test]
    fn rejects_descriptors_of_the_wrong_length()
    {
        let mut index = AnnIndex::new();
        index.insert(element("a", [1.0, 2.0, 3.0, 4.0])).unwrap();
        let wrong = HnswElement { feature_vector: vec![1.0; 3], path: PathBuf::from("x") };
        assert!(matches!(index.insert(wrong), Err(Error::DimensionMismatch(4, 3))));
        assert!(matches!(index.search(&[0.0; 5], 1, 8), Err(Error::DimensionMismatch(4, 5))));
    }

    #[test]
    fn dimension_is_learned_from_the_first_descriptor()
    {
        let mut index = AnnIndex::new();
        assert!(index.search(&[0.0; 7], 1, 8).unwrap().is_empty());
        index.insert(element("a", [1.0, 2.0, 3.0, 4.0])).unwrap();
        let wrong = HnswElement { feature_vector: vec![0.0; 2048], path: PathBuf::from("b") };
        assert!(matches!(index.insert(wrong), Err(Error::DimensionMismatch(4, 2048))));
    }

    #[test]
    fn empty_index_returns_nothing()
    {
        let index = AnnIndex::new();
        assert!(index.is_empty());
        assert!(index.search(&[0.0; 4], 3, 8).unwrap().is_empty());
    }

    #[test]
    fn search_width_is_raised_to_the_number_of_neighbours()
    {
        let mut index = AnnIndex::new();
        for i in 0..6 {
            index.insert(element(&format!("p{}", i), [i as f32, 0.0, 0.0, 0.0])).unwrap();
        }

        let results = index.search(&[0.0; 4], 4, 1).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.path.to_str().unwrap()).collect();
        assert_eq!(names, vec!["p0", "p1", "p2", "p3"]);
    }
}
