//! 8.3 short-name normalization with numeric-tail truncation.
//!
//! Ported from the the original driver's `filenameToFatElevenThree` /
//! `numericalTruncate` pair, generalized to Rust string handling and
//! corrected to operate byte-wise over the 11-byte canonical form rather
//! than through a pair of fixed C buffers.

pub const SHORT_NAME_LEN: usize = 11;
const BASE_LEN: usize = 8;
const EXT_LEN: usize = 3;

/// An 11-byte canonical short name: 8-byte base, 3-byte extension, each
/// right-padded with spaces, no embedded dot.
pub type ShortName = [u8; SHORT_NAME_LEN];

/// Normalizes an arbitrary input name into its canonical 11-byte form
/// (§4.1). Does not consider sibling entries; collision enumeration is a
/// property of the directory-aware callers, not of this pure function.
pub fn normalize(input: &str) -> ShortName {
    normalize_candidates(input)[0]
}

/// All canonical forms `input` could take: a single name when no numeric
/// tail is needed, or up to nine (`~1`..`~9`) when it is. Directory-aware
/// callers creating a *new* entry walk this list to find a free sibling
/// name instead of colliding with an unrelated name that truncated to
/// the same `~1` form (§9, open question 3).
pub fn normalize_candidates(input: &str) -> Vec<ShortName> {
    if input == ".." {
        return vec![pad(b"..", b"")];
    }
    if input == "." {
        return vec![pad(b".", b"")];
    }

    let trimmed = input.trim_end_matches(' ');
    let stripped = trimmed.trim_start_matches(|c: char| c == ' ' || c == '.');
    let leading_trimmed = stripped.len() != trimmed.len();

    let (base_src, ext_src) = match stripped.rfind('.') {
        Some(idx) => (&stripped[..idx], &stripped[idx + 1..]),
        None => (stripped, ""),
    };

    let (mut base, base_modified) = map_chars(base_src, true);
    let (mut ext, _) = map_chars(ext_src, false);

    let mut modified = base_modified || leading_trimmed;
    if base.len() > BASE_LEN {
        base.truncate(BASE_LEN);
        modified = true;
    }
    if ext.len() > EXT_LEN {
        ext.truncate(EXT_LEN);
    }

    if !modified {
        return vec![pad(&base, &ext)];
    }

    (1..=9)
        .map(|suffix| pad(&numeric_tail_with_suffix(&base, suffix), &ext))
        .collect()
}

/// Character mapping pass for one half (base or extension) of a name
/// (§4.1 step 3). `in_base` selects whether embedded dots/spaces are
/// dropped (true, base) or merely ignored as separators (false, ext —
/// the caller has already split on the rightmost dot, so no dots reach
/// here in practice).
fn map_chars(src: &str, in_base: bool) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    let mut modified = false;
    for c in src.chars() {
        if !c.is_ascii() {
            out.push(b'_');
            modified = true;
            continue;
        }
        let b = c as u8;
        if b.is_ascii_lowercase() {
            out.push(b.to_ascii_uppercase());
        } else if b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'~' {
            out.push(b);
        } else if in_base && (b == b' ' || b == b'.') {
            modified = true;
        } else if b == b'+' {
            out.push(b'_');
            modified = true;
        } else if b == b'_' {
            out.push(b'_');
        } else {
            out.push(b'_');
            modified = true;
        }
    }
    (out, modified)
}

/// Writes `~{suffix}` at position `min(base.len(), 6)`, shrinking the
/// base to exactly that position plus the tail's length.
pub fn numeric_tail_with_suffix(base: &[u8], suffix: u8) -> Vec<u8> {
    debug_assert!((1..=9).contains(&suffix));
    let k = base.len().min(6);
    let mut out = Vec::with_capacity(k + 2);
    out.extend_from_slice(&base[..k]);
    out.push(b'~');
    out.push(b'0' + suffix);
    out
}

fn pad(base: &[u8], ext: &[u8]) -> ShortName {
    let mut out = [b' '; SHORT_NAME_LEN];
    out[..base.len()].copy_from_slice(base);
    out[BASE_LEN..BASE_LEN + ext.len()].copy_from_slice(ext);
    out
}

/// Formats the canonical 11-byte name as a display string with an
/// inserted dot, trimming trailing padding (e.g. `"TEST    TXT"` ->
/// `"TEST.TXT"`, `".          "` -> `"."`).
pub fn display(name: &ShortName) -> String {
    let base = std::str::from_utf8(&name[..BASE_LEN]).unwrap_or("").trim_end();
    let ext = std::str::from_utf8(&name[BASE_LEN..]).unwrap_or("").trim_end();
    if base == "." || base == ".." {
        return base.to_string();
    }
    if ext.is_empty() {
        base.to_string()
    } else {
        format!("{base}.{ext}")
    }
}
