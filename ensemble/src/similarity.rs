//! Vector similarity measures shared by all scorers.

/// Cosine similarity in `[-1, 1]`.
///
/// Returns `None` for empty or mismatched inputs, zero-norm vectors, and
/// non-finite values, so degenerate features never reach the ensemble.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if !(dot.is_finite() && na.is_finite() && nb.is_finite()) {
        return None;
    }
    if na <= f64::MIN_POSITIVE || nb <= f64::MIN_POSITIVE {
        return None;
    }
    let sim = dot / (na.sqrt() * nb.sqrt());
    Some(sim.clamp(-1.0, 1.0))
}

/// Euclidean distance. Returns `None` for empty or mismatched inputs.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let d = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt();
    d.is_finite().then_some(d)
}

/// Widens an f32 embedding for f64 scoring.
pub fn widen(v: &[f32]) -> Vec<f64> {
    v.iter().map(|&x| x as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors() {
        let v = [0.3, -1.2, 4.0, 0.01];
        let s = cosine_similarity(&v, &v).unwrap();
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn negated_vectors() {
        let a = [1.0, 2.0, -3.0];
        let b = [-1.0, -2.0, 3.0];
        let s = cosine_similarity(&a, &b).unwrap();
        assert!((s + 1.0).abs() < 1e-12);
    }

    #[test]
    fn orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]), Some(0.0));
    }

    #[test]
    fn degenerate_inputs() {
        assert!(cosine_similarity(&[], &[]).is_none());
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_none());
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).is_none());
        assert!(cosine_similarity(&[f64::NAN, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn euclidean() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), Some(5.0));
        assert!(euclidean_distance(&[1.0], &[]).is_none());
    }

    #[test]
    fn widen_preserves_values() {
        assert_eq!(widen(&[0.5f32, -2.0]), vec![0.5, -2.0]);
    }
}
