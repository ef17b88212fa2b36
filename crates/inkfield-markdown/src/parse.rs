//! Scanning markdown text for image references to known attached files.
//!
//! On seed, every `![<title>](<name>)` occurrence whose `<name>` matches a
//! still-unclaimed file in the value's files list becomes a live `Success`
//! marker. Unmatched references stay inert plain text: only tracked
//! attachments get lifecycle behavior.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::value::FileRef;

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]\n]*)\]\(([^()\s]*)\)").expect("image syntax pattern")
});

/// One image reference found in the text, addressed in char offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImageMatch {
    pub title: SmolStr,
    pub name: SmolStr,
    /// Char offset of the `!`.
    pub start: usize,
    /// Char offset just past the closing `)`.
    pub end: usize,
}

/// Find all image references, left to right.
pub(crate) fn scan_images(text: &str) -> Vec<ImageMatch> {
    let mut matches = Vec::new();
    // running byte→char conversion; matches come back in ascending order
    let mut chars_before = 0usize;
    let mut bytes_before = 0usize;
    for caps in IMAGE_RE.captures_iter(text) {
        let m = caps.get(0).expect("whole match");
        chars_before += text[bytes_before..m.start()].chars().count();
        let len = text[m.start()..m.end()].chars().count();
        matches.push(ImageMatch {
            title: SmolStr::new(&caps[1]),
            name: SmolStr::new(&caps[2]),
            start: chars_before,
            end: chars_before + len,
        });
        chars_before += len;
        bytes_before = m.end();
    }
    matches
}

/// Pair matches with files by name, first-unclaimed order.
///
/// Returns `(match index, file)` pairs for every match that claimed a file.
/// Matches with an empty or unknown name claim nothing. When several files
/// share a name, association is by first-available order.
pub(crate) fn claim_files<'a>(
    matches: &[ImageMatch],
    files: &'a [FileRef],
) -> Vec<(usize, &'a FileRef)> {
    let mut claimed = vec![false; files.len()];
    let mut pairs = Vec::new();
    for (idx, m) in matches.iter().enumerate() {
        if m.name.is_empty() {
            continue;
        }
        let found = files
            .iter()
            .enumerate()
            .find(|(i, f)| !claimed[*i] && f.name == m.name);
        if let Some((i, file)) = found {
            claimed[i] = true;
            pairs.push((idx, file));
        }
    }
    pairs
}
