/// Canonical form used for comparing answers: lowercase ASCII letters, digits
/// and single spaces, with no leading or trailing space.
///
/// Dropped characters never separate words, so `"a - b"` becomes `"a b"` and
/// the function is idempotent.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}
