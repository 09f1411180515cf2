/// The two operations exposed by the command line: pairwise descriptor comparison,
/// and similarity search of a query image against a directory of images.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use cpu_time::ProcessTime;
use log::{debug, info, warn};
use ndarray::Array1;
use serde::Serialize;
use walkdir::WalkDir;

use crate::ann::{AnnIndex, HnswElement};
use crate::color::ColorDescriptor;
use crate::config::{Config, IndexConfig};
use crate::distance;
use crate::error::{Error, Result};
use crate::hash_index::HashIndex;
use crate::index::SimilarityIndex;
use crate::junk_drawer;
use crate::list_index::ListIndex;
use crate::models::{Method, Record, SearchResult};
use crate::preprocessing;
use crate::quadtree::QuadtreeIndex;
use crate::resnet::FeatureExtractor;

/// Euclidean distance between the descriptors of two of the compared images.
/// `first` and `second` index into the compared paths, `first < second`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PairDistance
{
    pub first: usize,
    pub second: usize,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct SearchRequest
{
    pub query: PathBuf,
    pub method: Method,
    pub images_dir: PathBuf,
    pub k: usize,
    pub index: IndexConfig,
}

impl SearchRequest
{
    pub fn new(query: PathBuf, method: Method, config: &Config) -> SearchRequest
    {
        SearchRequest {
            query,
            method,
            images_dir: config.images_dir.clone(),
            k: config.k,
            index: config.index.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport
{
    pub method: Method,
    pub query: PathBuf,
    pub results: Vec<SearchResult>,
    /// Images added to the index.
    pub indexed: usize,
    /// Images in the directory that could not be read.
    pub skipped: usize,
    /// CPU time spent by the process on indexing and querying.
    pub cpu_seconds: f64,
}

/// Computes a descriptor for every path, then the distance for every pair,
/// in the order (1, 2), (1, 3), ..., (2, 3), ...
pub fn compare(extractor: &dyn FeatureExtractor, paths: &[PathBuf]) -> Result<Vec<PairDistance>>
{
    if paths.len() < 2 {
        return Err(Error::NotEnoughImages(paths.len()));
    }

    let descriptors = paths.iter()
        .map(|path| {
            info!("Computing descriptor for {:?}", path);
            extractor.describe(path)
        })
        .collect::<Result<Vec<Array1<f32>>>>()?;

    pairwise_distances(&descriptors)
}

pub fn pairwise_distances(descriptors: &[Array1<f32>]) -> Result<Vec<PairDistance>>
{
    let mut distances = Vec::new();
    for first in 0..descriptors.len() {
        for second in first + 1..descriptors.len() {
            let distance = distance::euclidean(descriptors[first].view(), descriptors[second].view())?;
            distances.push(PairDistance { first, second, distance });
        }
    }
    Ok(distances)
}

pub fn render_pair_distances(distances: &[PairDistance]) -> String
{
    let mut out = String::new();
    for pair in distances {
        // Images are numbered from 1, in the order they were given.
        let _ = writeln!(out, "Distance between images {} - {}: {}", pair.first + 1, pair.second + 1, pair.distance);
    }
    out
}

/// Runs a similarity search of `request.query` against the images in `request.images_dir`.
/// The deep method needs an extractor; the colour methods ignore it.
pub fn search(request: &SearchRequest, extractor: Option<&dyn FeatureExtractor>) -> Result<SearchReport>
{
    let start = ProcessTime::now();

    let candidates = list_images(&request.images_dir, &request.query)?;
    info!("Searching {} images in {:?} with the {} method", candidates.len(), request.images_dir, request.method);

    let (results, indexed, skipped) = match request.method {
        Method::Deep => {
            let extractor = extractor.ok_or(Error::ModelRequired)?;
            deep_search(request, &candidates, extractor)?
        },
        Method::List => color_search(request, &candidates, ListIndex::new())?,
        Method::Quadtree => color_search(request, &candidates, QuadtreeIndex::new(&request.index))?,
        Method::Hash => color_search(request, &candidates, HashIndex::new())?,
    };

    let elapsed = start.elapsed();
    info!("Search took {} s of CPU time", junk_drawer::duration_to_seconds_string(elapsed));

    Ok(SearchReport {
        method: request.method,
        query: request.query.clone(),
        results,
        indexed,
        skipped,
        cpu_seconds: elapsed.as_secs_f64(),
    })
}

pub fn render_search_report(report: &SearchReport) -> String
{
    let mut out = String::new();
    let _ = writeln!(out, "Results ({}):", report.method);
    for result in &report.results {
        let _ = writeln!(out, "{}", result.path.display());
    }
    let _ = writeln!(out, "Elapsed: {:.3} seconds", report.cpu_seconds);
    out
}

/// Asks for a search method on `input`, printing the menu to `output`.
pub fn prompt_for_method(input: &mut impl BufRead, output: &mut impl Write) -> Result<Method>
{
    writeln!(output, "Choose the method:")?;
    for method in Method::ALL {
        writeln!(output, "{} - {}", method.menu_number(), method.label())?;
    }
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    answer.parse()
}

/// Regular files directly inside `dir`, sorted by name, excluding `query`.
pub fn list_images(dir: &Path, query: &Path) -> Result<Vec<PathBuf>>
{
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if junk_drawer::is_same_file(entry.path(), query) {
            debug!("Skipping the query image {:?}", entry.path());
            continue;
        }
        paths.push(entry.into_path());
    }
    Ok(paths)
}

fn color_record(id: usize, path: &Path) -> Result<Record>
{
    let image = preprocessing::load_image(path)?;
    let color = ColorDescriptor::from_image(&preprocessing::resize_for_color(&image));
    Ok(Record { id, path: path.to_path_buf(), color })
}

fn color_search(request: &SearchRequest, candidates: &[PathBuf], mut index: impl SimilarityIndex) -> Result<(Vec<SearchResult>, usize, usize)>
{
    let mut skipped = 0;
    for (id, path) in candidates.iter().enumerate() {
        match color_record(id, path) {
            Ok(record) => index.insert(record),
            Err(Error::UnreadableImage { path, source }) => {
                warn!("Skipping {:?}: {}", path, source);
                skipped += 1;
            },
            Err(e) => return Err(e),
        }
    }

    let query = color_record(candidates.len(), &request.query)?;
    let results = index.query(&query, request.k);
    Ok((results, index.len(), skipped))
}

fn deep_search(request: &SearchRequest, candidates: &[PathBuf], extractor: &dyn FeatureExtractor) -> Result<(Vec<SearchResult>, usize, usize)>
{
    let mut index = AnnIndex::new();
    let mut skipped = 0;
    for path in candidates {
        match extractor.describe(path) {
            Ok(descriptor) => index.insert(HnswElement { feature_vector: descriptor.to_vec(), path: path.clone() })?,
            Err(Error::UnreadableImage { path, source }) => {
                warn!("Skipping {:?}: {}", path, source);
                skipped += 1;
            },
            Err(e) => return Err(e),
        }
    }

    let query = extractor.describe(&request.query)?;
    let results = index.search(&query.to_vec(), request.k, request.index.ef_search)?;
    Ok((results, index.len(), skipped))
}
