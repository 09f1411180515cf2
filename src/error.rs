use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Ort(#[from] ort::Error),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    #[error("Unable to read image {path:?}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Model file not found at {0:?}. Set --model or LOOKALIKE_MODEL to an exported ResNet50 ONNX file.")]
    ModelNotFound(PathBuf),
    #[error("The path {0:?} is not a directory.")]
    NotADirectory(PathBuf),
    #[error("Descriptor lengths differ: {0} and {1}")]
    DimensionMismatch(usize, usize),
    #[error("At least two images are needed for a comparison, got {0}")]
    NotEnoughImages(usize),
    #[error("Invalid method: {0:?}")]
    InvalidMethod(String),
    #[error("The deep search method requires a loaded ResNet model")]
    ModelRequired,
}

pub type Result<T> = std::result::Result<T, Error>;
