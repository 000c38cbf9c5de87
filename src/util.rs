/// Upper bound on tool output quoted back in error messages.
pub const MAX_DETAIL_BYTES: usize = 512;

pub fn truncate_bytes(bytes: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    truncate_string(&text, max_bytes)
}

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

/// First non-blank line of captured stderr, bounded for error messages.
pub fn stderr_summary(stderr: &[u8]) -> Option<String> {
    let text = truncate_bytes(stderr, MAX_DETAIL_BYTES);
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
