pub fn l2_norm(v: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for x in v {
        sum += x * x;
    }
    sum.sqrt()
}

/// Cosine similarity with precomputed norms. A zero norm yields 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let mut dot = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
    }
    dot / (a_norm * b_norm)
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    cosine_similarity(a, b, l2_norm(a), l2_norm(b))
}

/// Mean of `cosine(source, t)` over `targets`; 0.0 when there are none.
pub fn mean_cosine(source: &[f32], targets: &[Vec<f32>]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let s_norm = l2_norm(source);
    let sum: f64 = targets
        .iter()
        .map(|t| cosine_similarity(source, t, s_norm, l2_norm(t)) as f64)
        .sum();
    sum / targets.len() as f64
}
