//! Summary statistics over feature trajectories.

pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Population standard deviation.
pub fn std_dev(v: &[f64]) -> f64 {
    central_moment(v, 2).sqrt()
}

pub fn median(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let mut sorted = v.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn range(v: &[f64]) -> f64 {
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = v.iter().copied().fold(f64::INFINITY, f64::min);
    if v.is_empty() { 0.0 } else { max - min }
}

fn central_moment(v: &[f64], k: i32) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let m = mean(v);
    v.iter().map(|x| (x - m).powi(k)).sum::<f64>() / v.len() as f64
}

/// Biased sample skewness. Zero for (near) constant input.
pub fn skewness(v: &[f64]) -> f64 {
    let m2 = central_moment(v, 2);
    if m2 < 1e-12 {
        return 0.0;
    }
    central_moment(v, 3) / m2.powf(1.5)
}

/// Biased excess kurtosis. Zero for (near) constant input.
pub fn excess_kurtosis(v: &[f64]) -> f64 {
    let m2 = central_moment(v, 2);
    if m2 < 1e-12 {
        return 0.0;
    }
    central_moment(v, 4) / (m2 * m2) - 3.0
}

/// Row-wise mean and standard deviation of a `[frames][dims]` matrix,
/// appended as all means followed by all deviations.
pub fn mean_std_columns(rows: &[Vec<f64>], dims: usize, out: &mut Vec<f64>) {
    let columns = columns(rows, dims);
    out.extend(columns.iter().map(|c| mean(c)));
    out.extend(columns.iter().map(|c| std_dev(c)));
}

/// Transposes `[frames][dims]` into `[dims][frames]`.
pub fn columns(rows: &[Vec<f64>], dims: usize) -> Vec<Vec<f64>> {
    (0..dims)
        .map(|d| rows.iter().map(|r| r[d]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_moments() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&v), 2.5);
        assert!((std_dev(&v) - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(median(&v), 2.5);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(range(&v), 3.0);
        assert!(skewness(&v).abs() < 1e-12);
        // Uniform over four points: m4 / m2^2 = 2.5625 / 1.5625 = 1.64.
        assert!((excess_kurtosis(&v) - (1.64 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn skewed_distribution() {
        assert!(skewness(&[1.0, 1.0, 1.0, 10.0]) > 0.0);
        assert!(skewness(&[-10.0, 1.0, 1.0, 1.0]) < 0.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(range(&[]), 0.0);
        assert_eq!(skewness(&[5.0; 4]), 0.0);
        assert_eq!(excess_kurtosis(&[5.0; 4]), 0.0);
    }

    #[test]
    fn column_summaries() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let mut out = Vec::new();
        mean_std_columns(&rows, 2, &mut out);
        assert_eq!(out, vec![2.0, 10.0, 1.0, 0.0]);
    }
}
