/// Colour descriptor used by the list, quadtree and hash indexes.
/// An HSV histogram with 8 hue, 3 saturation and 3 value bins, plus the
/// mean hue and mean saturation of the image, both scaled to [0, 1].
/// HSV follows the usual 8-bit conventions: H in [0, 180), S and V in [0, 255].

use image::RgbImage;

pub const HUE_BINS: usize = 8;
pub const SATURATION_BINS: usize = 3;
pub const VALUE_BINS: usize = 3;
pub const HISTOGRAM_BINS: usize = HUE_BINS * SATURATION_BINS * VALUE_BINS;

const HUE_RANGE: f32 = 180.0;
const CHANNEL_RANGE: f32 = 256.0;
const CHANNEL_MAX: f32 = 255.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ColorDescriptor
{
    /// L1 normalized; sums to 1 for any non-empty image.
    pub histogram: [f32; HISTOGRAM_BINS],
    pub mu_h: f32,
    pub mu_s: f32,
}

/// Coarse bucket key: dominant hue band, saturation level, brightness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashKey
{
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl std::fmt::Display for HashKey
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{}-{}-{}", self.hue, self.saturation, self.value)
    }
}

pub fn bin_index(hue_bin: usize, saturation_bin: usize, value_bin: usize) -> usize
{
    hue_bin * SATURATION_BINS * VALUE_BINS + saturation_bin * VALUE_BINS + value_bin
}

/// Converts an 8-bit RGB pixel to (H, S, V) with H in [0, 180) and S, V in [0, 255].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32)
{
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { CHANNEL_MAX * delta / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    // Half-degree hue so that it fits in a byte.
    ((h / 2.0) % HUE_RANGE, s, max)
}

impl ColorDescriptor
{
    pub fn from_image(image: &RgbImage) -> ColorDescriptor
    {
        let mut histogram = [0.0f32; HISTOGRAM_BINS];
        let mut sum_h = 0.0f64;
        let mut sum_s = 0.0f64;

        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            let (h, s, v) = rgb_to_hsv(r, g, b);

            let h_bin = ((h * HUE_BINS as f32 / HUE_RANGE) as usize).min(HUE_BINS - 1);
            let s_bin = ((s * SATURATION_BINS as f32 / CHANNEL_RANGE) as usize).min(SATURATION_BINS - 1);
            let v_bin = ((v * VALUE_BINS as f32 / CHANNEL_RANGE) as usize).min(VALUE_BINS - 1);
            histogram[bin_index(h_bin, s_bin, v_bin)] += 1.0;

            sum_h += h as f64;
            sum_s += s as f64;
        }

        let pixel_count = image.width() as usize * image.height() as usize;
        if pixel_count == 0 {
            return ColorDescriptor { histogram, mu_h: 0.0, mu_s: 0.0 };
        }

        let total = pixel_count as f32;
        histogram.iter_mut().for_each(|bin| *bin /= total);

        ColorDescriptor {
            histogram,
            mu_h: (sum_h / pixel_count as f64 / HUE_RANGE as f64) as f32,
            mu_s: (sum_s / pixel_count as f64 / CHANNEL_MAX as f64) as f32,
        }
    }

    pub fn hash_key(&self) -> HashKey
    {
        // Dominant hue band; the first band wins ties.
        let mut hue = 0;
        let mut max_mass = -1.0f32;
        for h in 0..HUE_BINS {
            let mut mass = 0.0f32;
            for s in 0..SATURATION_BINS {
                for v in 0..VALUE_BINS {
                    mass += self.histogram[bin_index(h, s, v)];
                }
            }
            if mass > max_mass {
                max_mass = mass;
                hue = h;
            }
        }

        let saturation = if self.mu_s < 0.33 { 0 } else if self.mu_s < 0.66 { 1 } else { 2 };

        // Mean value bin, weighted by the histogram mass.
        let mut mean_v = 0.0f32;
        let mut total = 0.0f32;
        for h in 0..HUE_BINS {
            for s in 0..SATURATION_BINS {
                for v in 0..VALUE_BINS {
                    let mass = self.histogram[bin_index(h, s, v)];
                    mean_v += v as f32 * mass;
                    total += mass;
                }
            }
        }
        mean_v /= total + 1e-8;
        let value = if mean_v < 1.0 { 0 } else if mean_v < 2.0 { 1 } else { 2 };

        HashKey { hue: hue as u8, saturation, value }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::Rgb;

    #[test]
    fn hsv_of_primary_colours()
    {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0.0, 255.0, 255.0));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60.0, 255.0, 255.0));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120.0, 255.0, 255.0));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0.0, 0.0, 0.0));
        assert_eq!(rgb_to_hsv(128, 128, 128), (0.0, 0.0, 128.0));
    }

    #[test]
    fn hue_wraps_below_180()
    {
        // Magenta-ish red: negative raw hue.
        let (h, _, _) = rgb_to_hsv(255, 0, 10);
        assert!(h > 170.0 && h < 180.0, "hue was {}", h);
    }

    #[test]
    fn histogram_of_a_solid_image_has_a_single_bin()
    {
        let image = RgbImage::from_pixel(16, 16, Rgb([0, 0, 255]));
        let descriptor = ColorDescriptor::from_image(&image);

        // Hue 120 -> band 5, full saturation and value -> bins 2, 2.
        let expected = bin_index(5, 2, 2);
        assert_abs_diff_eq!(descriptor.histogram[expected], 1.0);
        assert_abs_diff_eq!(descriptor.histogram.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(descriptor.mu_h, 120.0 / 180.0, epsilon = 1e-6);
        assert_abs_diff_eq!(descriptor.mu_s, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn histogram_sums_to_one_and_means_stay_in_range()
    {
        let image = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, ((x + y) * 3) as u8]));
        let descriptor = ColorDescriptor::from_image(&image);

        assert_abs_diff_eq!(descriptor.histogram.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert!((0.0..=1.0).contains(&descriptor.mu_h));
        assert!((0.0..=1.0).contains(&descriptor.mu_s));
    }

    #[test]
    fn empty_image_gives_an_empty_descriptor()
    {
        let descriptor = ColorDescriptor::from_image(&RgbImage::new(0, 0));
        assert!(descriptor.histogram.iter().all(|&bin| bin == 0.0));
        assert_eq!(descriptor.mu_h, 0.0);
        assert_eq!(descriptor.mu_s, 0.0);
    }

    #[test]
    fn hash_key_of_solid_colours()
    {
        let blue = ColorDescriptor::from_image(&RgbImage::from_pixel(8, 8, Rgb([0, 0, 255])));
        assert_eq!(blue.hash_key(), HashKey { hue: 5, saturation: 2, value: 2 });

        let dark_grey = ColorDescriptor::from_image(&RgbImage::from_pixel(8, 8, Rgb([40, 40, 40])));
        assert_eq!(dark_grey.hash_key(), HashKey { hue: 0, saturation: 0, value: 0 });

        let mid_grey = ColorDescriptor::from_image(&RgbImage::from_pixel(8, 8, Rgb([128, 128, 128])));
        assert_eq!(mid_grey.hash_key().value, 1);
        assert_eq!(mid_grey.hash_key().to_string(), "0-0-1");
    }
}
