use std::path::PathBuf;

/// Environment variable that overrides the default model location.
pub const MODEL_ENV_VAR: &str = "LOOKALIKE_MODEL";
pub const MODEL_FILENAME: &str = "resnet50_notop.onnx";

pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_K: usize = 3;
pub const DEFAULT_INTRA_THREADS: usize = 4;

#[derive(Debug, Clone)]
pub struct Config
{
    pub model: ModelConfig,
    pub index: IndexConfig,
    /// Directory scanned by the search command. Not recursive.
    pub images_dir: PathBuf,
    /// Number of neighbours returned by a search.
    pub k: usize,
}

/// ONNX Runtime session options for the ResNet feature extractor.
#[derive(Debug, Clone)]
pub struct ModelConfig
{
    pub model_path: PathBuf,
    pub intra_threads: usize,
}

#[derive(Debug, Clone)]
pub struct IndexConfig
{
    /// Points held by a quadtree node before it subdivides.
    pub quadtree_capacity: usize,
    /// Half extent of the square searched around the query in the (mean hue, mean saturation) plane.
    pub quadtree_radius: f32,
    /// Search width of the HNSW graph. Raised to k when smaller.
    pub ef_search: usize,
}

impl Default for Config
{
    fn default() -> Self
    {
        Config {
            model: ModelConfig::default(),
            index: IndexConfig::default(),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            k: DEFAULT_K,
        }
    }
}

impl Default for ModelConfig
{
    fn default() -> Self
    {
        ModelConfig {
            model_path: default_model_path(),
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}

impl Default for IndexConfig
{
    fn default() -> Self
    {
        IndexConfig {
            quadtree_capacity: 4,
            quadtree_radius: 0.2,
            ef_search: 64,
        }
    }
}

/// The model lives in the user's cache directory, like the weights cache of
/// most deep learning toolkits. Falls back to a `models/` directory relative
/// to the working directory on platforms without a cache directory.
pub fn default_model_path() -> PathBuf
{
    match dirs::cache_dir() {
        Some(cache) => cache.join("lookalike").join(MODEL_FILENAME),
        None => PathBuf::from("models").join(MODEL_FILENAME),
    }
}
