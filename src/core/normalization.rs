use ndarray::Array2;

/// Largest raw pixel intensity of a grayscale digit image.
pub const PIXEL_MAX: f64 = 255.0;

pub trait Normalization {
    fn to_unity(&mut self, lb: f64, ub: f64);

    /// Scales raw pixel intensities from `[0, 255]` into `[0, 1]`.
    fn normalize_pixels(&mut self) {
        self.to_unity(0.0, PIXEL_MAX);
    }
}

impl Normalization for Array2<f64> {
    fn to_unity(&mut self, lb: f64, ub: f64) {
        let range = ub - lb;

        // If the range is zero or nearly zero, all values become 0.0
        if range.abs() < f64::EPSILON {
            self.fill(0.0);
        } else {
            self.mapv_inplace(|val| (val - lb) / range);
        }
    }
}
