//! Splitting long replies to fit a platform's message size limit.
//!
//! Lengths are counted in characters, not bytes, and cuts always land on
//! character boundaries.

/// Splits `text` into pieces of at most `max_length` characters.
///
/// Text that already fits is returned untouched as a single piece.
/// Otherwise each piece is cut, in order of preference, at the last
/// paragraph break, after the last sentence end (the period stays with the
/// piece), at the last space, or hard at `max_length`. Pieces are trimmed
/// and empty pieces are dropped. A `max_length` of zero is treated as one.
#[must_use]
pub fn chunk(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);

    if text.chars().count() <= max_length {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some(limit) = char_limit(remaining, max_length) else {
            chunks.push(remaining.to_string());
            break;
        };

        let split_at = split_point(&remaining[..limit]).unwrap_or(limit);

        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        remaining = remaining[split_at..].trim();
    }

    chunks
}

/// Byte offset just past the first `max_chars` characters, or `None` if
/// the text is no longer than that.
fn char_limit(text: &str, max_chars: usize) -> Option<usize> {
    text.char_indices().nth(max_chars).map(|(offset, _)| offset)
}

/// Best place to cut `window`, or `None` if it has no usable boundary.
///
/// A boundary at offset zero would produce an empty piece, so it does not
/// count.
fn split_point(window: &str) -> Option<usize> {
    let usable = |offset: &usize| *offset > 0;

    window
        .rfind("\n\n")
        .filter(usable)
        .or_else(|| window.rfind(". ").map(|offset| offset + 1))
        .or_else(|| window.rfind(' ').filter(usable))
}
