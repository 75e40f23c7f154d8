//! Content-size budgeting for extraction input.
//!
//! When evidence chunks together exceed the cap, every chunk is trimmed in
//! proportion to its size instead of dropping the tail, so the extractor
//! still sees every source. Each chunk keeps at least `floor` characters
//! whenever `chunks * floor` fits under the cap.
//!
//! Chunks are ordered strongest evidence first. When the cap cannot hold the
//! separators and floors of every chunk, [`join_within_budget`] drops chunks
//! from the end until it can.
//!
//! Lengths are counted in characters, not bytes.

use tracing::debug;

/// Separator placed between chunks by [`join_within_budget`].
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Truncate text to at most `cap` characters.
pub fn cap_content(text: &str, cap: usize) -> String {
    truncate_chars(text, cap).to_string()
}

/// Trim chunks proportionally so their combined length is at most `cap`.
pub fn trim_proportionally(chunks: &[String], cap: usize, floor: usize) -> Vec<String> {
    let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
    let total: usize = lengths.iter().sum();
    if total <= cap {
        return chunks.to_vec();
    }
    if chunks.is_empty() {
        return Vec::new();
    }

    let allowances = if chunks.len().saturating_mul(floor) >= cap {
        // The floor cannot be honored for everyone; split evenly.
        let even = cap / chunks.len();
        lengths.iter().map(|len| (*len).min(even)).collect::<Vec<_>>()
    } else {
        let floors: Vec<usize> = lengths.iter().map(|len| (*len).min(floor)).collect();
        let remaining = cap - floors.iter().sum::<usize>();
        let excess: Vec<usize> = lengths.iter().zip(&floors).map(|(len, f)| len - f).collect();
        let total_excess: usize = excess.iter().sum();

        floors
            .iter()
            .zip(&excess)
            .map(|(f, e)| {
                let share = if total_excess == 0 {
                    0
                } else {
                    ((remaining as u128 * *e as u128) / total_excess as u128) as usize
                };
                f + share.min(*e)
            })
            .collect()
    };

    chunks
        .iter()
        .zip(allowances)
        .map(|(chunk, allowance)| truncate_chars(chunk, allowance).to_string())
        .collect()
}

/// Join chunks with [`CHUNK_SEPARATOR`], trimming so the result fits in `cap`.
///
/// Every kept chunk keeps at least one character.
pub fn join_within_budget(chunks: &[String], cap: usize, floor: usize) -> String {
    let mut chunks: Vec<String> = chunks.iter().filter(|c| !c.trim().is_empty()).cloned().collect();
    if chunks.is_empty() {
        return String::new();
    }

    let floor = floor.max(1);
    let separator_len = CHUNK_SEPARATOR.chars().count();
    let reserved: Vec<usize> = chunks.iter().map(|c| c.chars().count().min(floor)).collect();
    let mut keep = chunks.len();
    while keep > 1 && separator_len * (keep - 1) + reserved[..keep].iter().sum::<usize>() > cap {
        keep -= 1;
    }
    if keep < chunks.len() {
        let dropped = chunks.len() - keep;
        debug!(kept = keep, dropped, cap, "content cap too small for every chunk");
        chunks.truncate(keep);
    }

    let content_cap = cap.saturating_sub(separator_len * (keep - 1));
    trim_proportionally(&chunks, content_cap, floor).join(CHUNK_SEPARATOR)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
