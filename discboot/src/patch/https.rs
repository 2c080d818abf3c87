//! `https://` to `http://` rewrite
//!
//! Online titles reach services over TLS endpoints that no longer accept the
//! console's handshake. Dropping the `s` in place keeps every string the same
//! allocation: the NUL-terminated remainder moves left one byte and the
//! freed byte before the terminator becomes NUL.

const SCHEME: &[u8] = b"https://";

/// Rewrite every `https://` URL in the window
///
/// A scheme followed directly by NUL (or the window end) is left alone. The
/// shifted string ends at its NUL terminator or at the window end, whichever
/// comes first.
///
/// # Returns
/// Number of URLs rewritten
pub fn downgrade_urls(window: &mut [u8]) -> usize {
    let mut rewritten = 0;
    let mut cur = 0;

    while cur + SCHEME.len() < window.len() {
        if &window[cur..cur + SCHEME.len()] != SCHEME || window[cur + SCHEME.len()] == 0 {
            cur += 1;
            continue;
        }

        let end = window[cur..]
            .iter()
            .position(|&b| b == 0)
            .map_or(window.len(), |n| cur + n);

        // "https://host" -> "http://host\0"
        window.copy_within(cur + 5..end, cur + 4);
        window[end - 1] = 0;
        rewritten += 1;
        cur = end;
    }

    if rewritten > 0 {
        log::debug!("downgraded {} https URLs", rewritten);
    }
    rewritten
}
