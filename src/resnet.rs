use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, Array4, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::preprocessing::{self, FEATURE_VECTOR_LENGTH};

/// Anything that maps an image file to a descriptor.
pub trait FeatureExtractor
{
    fn describe(&self, path: &Path) -> Result<Array1<f32>>;
}

/// ResNet50 trained on ImageNet with the classification head removed and global average
/// pooling applied to the last convolutional block, used as a fixed feature extractor.
/// Each image maps to a descriptor of FEATURE_VECTOR_LENGTH values.
///
/// Uses an ONNX export of the Keras `ResNet50(weights="imagenet", include_top=False, pooling="avg")`
/// model, so the input is NHWC (batch, 224, 224, 3) in BGR order with the ImageNet means subtracted.
/// See preprocessing::image_to_resnet_format().
///
/// Unlike embeddings meant for cosine search, the output is not normalized;
/// descriptors are compared with plain Euclidean distance.
pub struct ResNet
{
    session: Session,
}

impl ResNet
{
    pub fn new(config: &ModelConfig) -> Result<Self>
    {
        if !config.model_path.is_file() {
            return Err(Error::ModelNotFound(config.model_path.clone()));
        }

        info!("Loading ResNet50 from {:?}", config.model_path);
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .commit_from_file(&config.model_path)?;

        Ok( ResNet { session } )
    }

    /// Given a batch of images, returns their descriptors.
    /// Use preprocessing::image_to_resnet_format() to build the input.
    ///
    /// Returns a 2D array of shape (batch_size, FEATURE_VECTOR_LENGTH).
    pub fn encode_images(&self, images: Array4<f32>) -> Result<Array2<f32>>
    {
        let images_len = images.len_of(Axis(0));
        let input = Tensor::from_array(images)?;
        let outputs = self.session.run(inputs![input]?)?;

        // The pooled model has a single output: (batch, 2048).
        let output = outputs[0].try_extract_tensor::<f32>()?;
        let output = output.to_shape((images_len, FEATURE_VECTOR_LENGTH))?.to_owned();

        Ok(output)
    }
}

impl FeatureExtractor for ResNet
{
    /// Loads the image at `path` and returns its descriptor.
    fn describe(&self, path: &Path) -> Result<Array1<f32>>
    {
        let image = preprocessing::load_image(path)?;
        let resized = preprocessing::resize_for_resnet(&image);
        let input = preprocessing::image_to_resnet_format(&[resized]);

        let now = std::time::Instant::now();
        let descriptors = self.encode_images(input)?;
        debug!("Forward pass for {:?} took {:?}", path, now.elapsed());

        Ok(descriptors.index_axis_move(Axis(0), 0))
    }
}
