// Stats module - order statistics and moments over pixel populations
//
// Populations are plain f64 slices gathered from an image through a mask.
// Callers are expected to have dropped non-finite values already.

/// Median of a population (mean of the two middle values for even lengths).
///
/// Reorders `values` in place. Returns `None` for an empty population.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let len = values.len();
    let (lower, upper, _) = values.select_nth_unstable_by(len / 2, f64::total_cmp);
    let upper = *upper;

    if len % 2 == 1 {
        return Some(upper);
    }

    let lower_max = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((lower_max + upper) / 2.0)
}

/// Arithmetic mean, `None` for an empty population.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0) around a known mean.
///
/// A population of identical values has exactly zero spread, even when its
/// mean is not representable and the summed squares leave rounding residue.
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|&v| v == first) {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Median absolute deviation around the population median (unscaled).
pub fn median_absolute_deviation(values: &mut [f64]) -> Option<f64> {
    let center = median(values)?;
    let mut deviations: Vec<f64> = values.iter().map(|&v| (v - center).abs()).collect();
    median(&mut deviations)
}

/// Statistics of a population after iterative sigma clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    /// Values that survived clipping
    pub retained: usize,
    /// Clipping passes actually run
    pub iterations: usize,
}

/// Iterative sigma clipping around the median.
///
/// Each pass rejects values outside `median ± sigma * std` (bounds inclusive)
/// and recomputes both on the survivors. Stops when a pass rejects nothing or
/// after `max_iters` passes (`None` means run to convergence).
pub fn sigma_clipped_stats(
    mut values: Vec<f64>,
    sigma: f64,
    max_iters: Option<usize>,
) -> Option<ClippedStats> {
    if values.is_empty() {
        return None;
    }

    let mut iterations = 0;
    loop {
        if max_iters.is_some_and(|cap| iterations >= cap) {
            break;
        }

        let center = median(&mut values)?;
        let avg = mean(&values)?;
        let std = population_std(&values, avg);
        let lo = center - sigma * std;
        let hi = center + sigma * std;

        let before = values.len();
        values.retain(|&v| v >= lo && v <= hi);
        iterations += 1;

        if values.len() == before || values.is_empty() {
            break;
        }
    }

    let avg = mean(&values)?;
    let std = population_std(&values, avg);
    let center = median(&mut values)?;

    Some(ClippedStats {
        mean: avg,
        median: center,
        std,
        retained: values.len(),
        iterations,
    })
}
