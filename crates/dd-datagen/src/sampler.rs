//! Weighted choice and bounded-Gaussian draws.
//!
//! Every branching point of the category model goes through [`pick`]; the
//! latency field goes through [`bounded_gaussian`]. Both take the random
//! source explicitly so callers decide whether it is per-task, per-thread or
//! seeded for tests.

use rand::Rng;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("cannot pick from {len} item(s) with total weight {total}")]
    InvalidDistribution { len: usize, total: f64 },
    #[error("invalid latency parameters: mean={mean}, stddev={stddev}")]
    InvalidLatency { mean: f64, stddev: f64 },
}

/// Anything with a relative selection weight.
pub trait Weighted {
    fn weight(&self) -> f64;
}

impl<V> Weighted for (V, f64) {
    fn weight(&self) -> f64 {
        self.1
    }
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

/// Pick one item with probability `weight / total`.
///
/// Draws a single uniform `target` in `[0, total)` and returns the first item
/// whose cumulative weight exceeds it. If rounding leaves the accumulator at
/// or below `target` after the last item, the last item is returned.
///
/// Fails when `items` is empty, any weight is negative or not finite, or the
/// weights sum to zero.
pub fn pick<'a, T, R>(items: &'a [T], rng: &mut R) -> Result<&'a T, SampleError>
where
    T: Weighted,
    R: Rng,
{
    let total = total_weight(items)?;
    let target = rng.random_range(0.0..total);

    let mut cumulative = 0.0;
    for item in items {
        cumulative += item.weight();
        if target < cumulative {
            return Ok(item);
        }
    }
    // non-empty: checked by total_weight
    Ok(&items[items.len() - 1])
}

fn total_weight<T: Weighted>(items: &[T]) -> Result<f64, SampleError> {
    let mut total = 0.0;
    for item in items {
        let w = item.weight();
        if !w.is_finite() || w < 0.0 {
            return Err(SampleError::InvalidDistribution {
                len: items.len(),
                total: w,
            });
        }
        total += w;
    }
    if items.is_empty() || total <= 0.0 || !total.is_finite() {
        return Err(SampleError::InvalidDistribution {
            len: items.len(),
            total,
        });
    }
    Ok(total)
}

/// One draw from `N(mean, stddev)` clamped below at zero.
///
/// Values under zero are clamped rather than resampled, so the upper tail
/// keeps its Gaussian shape. `stddev == 0` always yields `max(0, mean)`.
pub fn bounded_gaussian<R: Rng>(mean: f64, stddev: f64, rng: &mut R) -> Result<f64, SampleError> {
    if !mean.is_finite() || !stddev.is_finite() || stddev < 0.0 {
        return Err(SampleError::InvalidLatency { mean, stddev });
    }
    let normal =
        Normal::new(mean, stddev).map_err(|_| SampleError::InvalidLatency { mean, stddev })?;
    Ok(normal.sample(rng).max(0.0))
}
