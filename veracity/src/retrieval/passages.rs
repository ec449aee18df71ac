use crate::detection::SentenceSegmenter;

/// Sliding windows of `window` sentences that advance by
/// `window - overlap` sentences. The final window may be shorter.
pub fn sliding_windows(sentences: &[String], window: usize, overlap: usize) -> Vec<String> {
    if sentences.is_empty() {
        return Vec::new();
    }
    let window = window.max(1);
    let step = window.saturating_sub(overlap).max(1);

    (0..sentences.len())
        .step_by(step)
        .map(|start| {
            let end = (start + window).min(sentences.len());
            sentences[start..end].join(" ")
        })
        .collect()
}

/// Splits each document into overlapping sentence windows, preserving
/// document order.
pub fn chunk_documents(
    segmenter: &dyn SentenceSegmenter,
    documents: &[String],
    window: usize,
    overlap: usize,
) -> Vec<String> {
    documents
        .iter()
        .flat_map(|doc| sliding_windows(&segmenter.segment(doc), window, overlap))
        .collect()
}

/// Keeps passages scoring at least `threshold`, best first, at most `limit`.
/// Equal scores keep their original order.
pub fn rank_passages(
    passages: Vec<String>,
    scores: &[f32],
    threshold: f32,
    limit: usize,
) -> Vec<String> {
    let mut relevant: Vec<(String, f32)> = passages
        .into_iter()
        .zip(scores.iter().copied())
        .filter(|(_, score)| *score >= threshold)
        .collect();

    relevant.sort_by(|a, b| b.1.total_cmp(&a.1));
    relevant
        .into_iter()
        .take(limit)
        .map(|(passage, _)| passage)
        .collect()
}
