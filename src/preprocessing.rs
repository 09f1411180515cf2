/// Preprocessing functions for input data for the ResNet50 model and the colour descriptor.
/// The ResNet path mirrors the Keras ResNet50 pipeline the exported model was trained with:
/// nearest-neighbour resize to 224x224, RGB to BGR, ImageNet mean subtraction, NHWC layout.

use std::path::Path;
use image::{imageops::{self, FilterType}, DynamicImage, RgbImage};
use ndarray::{Array, Array4};

use crate::error::{Error, Result};

pub const IMAGE_INPUT_SIZE: usize = 224;
pub const FEATURE_VECTOR_LENGTH: usize = 2048;
pub const COLOR_INPUT_SIZE: u32 = 256;

/// ImageNet channel means in BGR order, on the 0-255 scale.
pub const IMAGENET_MEAN_BGR: [f32; 3] = [103.939, 116.779, 123.68];

pub fn load_image(path: &Path) -> Result<DynamicImage>
{
	image::open(path).map_err(|source| Error::UnreadableImage { path: path.to_path_buf(), source })
}

pub fn resize_for_resnet(image: &DynamicImage) -> RgbImage
{
	image
		.resize_exact(IMAGE_INPUT_SIZE as u32, IMAGE_INPUT_SIZE as u32, FilterType::Nearest)
		.to_rgb8()
}

pub fn resize_for_color(image: &DynamicImage) -> RgbImage
{
	image
		.resize_exact(COLOR_INPUT_SIZE, COLOR_INPUT_SIZE, FilterType::Triangle)
		.to_rgb8()
}

// Convert the images to the 4D (batch, height, width, channel) array expected by ResNet50.
// Images that are not already 224x224 are resized first.
pub fn image_to_resnet_format(images: &[RgbImage]) -> Array4<f32>
{
	let mut image_input = Array::zeros((images.len(), IMAGE_INPUT_SIZE, IMAGE_INPUT_SIZE, 3));
	for (idx, img) in images.iter().enumerate()
	{
		let resized;
		let img = if img.dimensions() == (IMAGE_INPUT_SIZE as u32, IMAGE_INPUT_SIZE as u32) {
			img
		} else {
			resized = imageops::resize(img, IMAGE_INPUT_SIZE as u32, IMAGE_INPUT_SIZE as u32, FilterType::Nearest);
			&resized
		};

		for (x, y, pixel) in img.enumerate_pixels() {
			let x = x as usize;
			let y = y as usize;
			let [r, g, b] = pixel.0;
			image_input[[idx, y, x, 0]] = b as f32 - IMAGENET_MEAN_BGR[0];
			image_input[[idx, y, x, 1]] = g as f32 - IMAGENET_MEAN_BGR[1];
			image_input[[idx, y, x, 2]] = r as f32 - IMAGENET_MEAN_BGR[2];
		}
	}

	image_input
}
