/// RFC 5322 atext punctuation allowed in a dot-atom local part.
const ATEXT_PUNCT: &[u8] = b"!#$%&'*+-/=?^_`{|}~";

fn is_atext(b: u8) -> bool {
    b.is_ascii_alphanumeric() || ATEXT_PUNCT.contains(&b)
}

/// Unquoted dot-atom: one or more atext runs joined by single dots.
/// Quoted local parts are refused; no mailbox worth probing needs them.
pub(crate) fn is_dot_atom(local: &str) -> bool {
    local
        .split('.')
        .all(|atom| !atom.is_empty() && atom.bytes().all(is_atext))
}
