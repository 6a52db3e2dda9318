#[allow(unused)]
use crate::prelude::*;

/// Scale applied to standard-normal samples when initialising weights.
pub const INIT_SCALE: f64 = 0.01;

/// Small random matrix of the given shape: standard normal samples times
/// [`INIT_SCALE`].
#[macro_export]
macro_rules! rand_array {
    ($($x:expr),*) => {
        {
            Array2::<f64>::random(($($x,)*), StandardNormal) * $crate::utils::INIT_SCALE
        }
    };
}

/// Index of the largest entry in each column. Ties resolve to the lowest
/// row index.
pub fn argmax_columns(a: &Array2<f64>) -> Vec<usize> {
    a.columns()
        .into_iter()
        .map(|column| {
            column
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
                    if v > max { (i, v) } else { (best, max) }
                })
                .0
        })
        .collect()
}
