use std::collections::HashSet;

pub const CITATION_PREVIEW_CHARS: usize = 50;

/// One citation per distinct passage preview: the first
/// [`CITATION_PREVIEW_CHARS`] characters followed by `...`. First occurrence
/// wins.
pub fn citations_for(sources: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let preview: String = source.chars().take(CITATION_PREVIEW_CHARS).collect();
            format!("{preview}...")
        })
        .filter(|citation| seen.insert(citation.clone()))
        .collect()
}
