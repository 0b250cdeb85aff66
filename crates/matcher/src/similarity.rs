/// Cosine similarity between two equal-length, non-zero vectors.
///
/// Both preconditions hold for everything an embedding provider emits, so they
/// are asserted in debug builds only.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine_similarity on unequal lengths");

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&x, &y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    debug_assert!(
        norm_a > 0.0 && norm_b > 0.0,
        "cosine_similarity on a zero vector"
    );
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
