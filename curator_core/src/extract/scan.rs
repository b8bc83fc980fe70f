//! Span finders over raw response text.
//!
//! All delimiters are ASCII, so byte offsets found here are always char
//! boundaries of the original `&str`.

/// Outcome of the bracket-balanced scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scan<'a> {
    /// The stack emptied; this is the span from the first opener to its closer.
    Closed(&'a str),
    /// A closer did not match the innermost opener.
    Mismatch,
    /// No opener at all, or the text ended with openers still pending.
    Unterminated,
}

/// Scan from the first `[` or `{` until its matching closer.
///
/// Quoted runs (single or double) are skipped with backslash-escape
/// awareness.
pub(super) fn balanced_span(text: &str) -> Scan<'_> {
    let bytes = text.as_bytes();
    let Some(start) = bytes.iter().position(|b| matches!(b, b'[' | b'{')) else {
        return Scan::Unterminated;
    };

    let mut closers: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if let Some(open_quote) = quote {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == open_quote {
                quote = None;
            }
            continue;
        }

        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'[' => closers.push(b']'),
            b'{' => closers.push(b'}'),
            b']' | b'}' => {
                if closers.pop() != Some(byte) {
                    return Scan::Mismatch;
                }
                if closers.is_empty() {
                    return Scan::Closed(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Scan::Unterminated
}

/// Span from the first `[` to the last `]`, inclusive.
pub(super) fn greedy_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}
