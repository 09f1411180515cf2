use ndarray::ArrayView1;

use crate::color::HISTOGRAM_BINS;
use crate::error::{Error, Result};

/// Keeps empty bins from dividing by zero.
const CHI_SQUARE_EPSILON: f32 = 1e-8;

/// Euclidean (L2) norm of the difference between two descriptors.
/// Smaller is more similar; a descriptor is at distance 0 from itself.
pub fn euclidean(a: ArrayView1<f32>, b: ArrayView1<f32>) -> Result<f32>
{
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch(a.len(), b.len()));
    }
    let diff = &a - &b;
    Ok(diff.dot(&diff).sqrt())
}

/// Chi-square distance between two colour histograms.
pub fn chi_square(h1: &[f32; HISTOGRAM_BINS], h2: &[f32; HISTOGRAM_BINS]) -> f32
{
    let sum: f32 = h1.iter()
        .zip(h2.iter())
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff / (a + b + CHI_SQUARE_EPSILON)
        })
        .sum();
    0.5 * sum
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    #[test]
    fn euclidean_of_a_descriptor_with_itself_is_zero()
    {
        let d = Array1::linspace(-3.0, 7.5, 2048);
        assert_eq!(euclidean(d.view(), d.view()).unwrap(), 0.0);
    }

    #[test]
    fn euclidean_is_symmetric()
    {
        let d1 = Array1::linspace(0.0, 1.0, 2048);
        let d2 = d1.mapv(|x: f32| (x * 13.0).sin());
        let forward = euclidean(d1.view(), d2.view()).unwrap();
        let backward = euclidean(d2.view(), d1.view()).unwrap();
        assert_eq!(forward, backward);
        assert!(forward > 0.0);
    }

    #[test]
    fn euclidean_matches_the_hand_computed_value()
    {
        let a = array![0.0f32, 3.0, 1.0];
        let b = array![4.0f32, 0.0, 1.0];
        assert_abs_diff_eq!(euclidean(a.view(), b.view()).unwrap(), 5.0);
    }

    #[test]
    fn euclidean_rejects_mismatched_lengths()
    {
        let a = array![1.0f32, 2.0];
        let b = array![1.0f32, 2.0, 3.0];
        assert!(matches!(euclidean(a.view(), b.view()), Err(Error::DimensionMismatch(2, 3))));
    }

    #[test]
    fn chi_square_properties()
    {
        let mut h1 = [0.0f32; HISTOGRAM_BINS];
        let mut h2 = [0.0f32; HISTOGRAM_BINS];
        h1[0] = 0.5;
        h1[10] = 0.5;
        h2[0] = 0.25;
        h2[71] = 0.75;

        assert_eq!(chi_square(&h1, &h1), 0.0);
        assert_eq!(chi_square(&h1, &h2), chi_square(&h2, &h1));

        // 0.5 * (0.0625 / 0.75 + 0.25 / 0.5 + 0.5625 / 0.75)
        assert_abs_diff_eq!(chi_square(&h1, &h2), 0.5 * (0.0625 / 0.75 + 0.5 + 0.75), epsilon = 1e-6);
    }

    #[test]
    fn disjoint_histograms_are_at_distance_one()
    {
        let mut h1 = [0.0f32; HISTOGRAM_BINS];
        let mut h2 = [0.0f32; HISTOGRAM_BINS];
        h1[3] = 1.0;
        h2[4] = 1.0;
        assert_abs_diff_eq!(chi_square(&h1, &h2), 1.0, epsilon = 1e-6);
    }
}
