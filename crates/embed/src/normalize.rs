use crate::EmbedError;

/// In-place L2 normalization helper to keep allocations down during hot paths.
///
/// Fails instead of returning the zero vector: downstream cosine similarity
/// divides by the norm and relies on it being non-zero.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) -> Result<(), EmbedError> {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if !norm_sq.is_finite() || norm_sq <= 0.0 {
        return Err(EmbedError::Inference(format!(
            "cannot normalize vector with squared norm {norm_sq}"
        )));
    }
    let inv_norm = norm_sq.sqrt().recip();
    for x in v.iter_mut() {
        *x *= inv_norm;
    }
    Ok(())
}
