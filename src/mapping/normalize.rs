//! Label normalization: turns a raw text blob into candidate device labels.
//!
//! CAD exports often position every glyph separately, so a label such as
//! `D101` comes out of the text layer as `D 1 0 1`. The kerning repair stage
//! glues those runs back together before tokenizing. The stage is lossy: two
//! genuinely separate one-character words are merged too.

use indexmap::IndexSet;

/// Shortest accepted candidate, in characters.
pub const MIN_LABEL_LEN: usize = 2;
/// Longest accepted candidate, in characters.
pub const MAX_LABEL_LEN: usize = 14;

/// Tuning knobs for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub kerning_repair: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions { kerning_repair: true }
    }
}

fn is_word_char(c: &char) -> bool {
    c.is_ascii_alphanumeric() || *c == '_'
}

/// Merge per-glyph spacing: an alphanumeric followed by whitespace and then a
/// lone alphanumeric (one not followed by another word character) loses the
/// whitespace in between.
///
/// `"D 1 0 1 SP 0 1"` becomes `"D101 SP01"`; `"AP1 PH1"` is left alone.
pub fn repair_kerning(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if !c.is_ascii_alphanumeric() {
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        let lone_alnum = j > i
            && j < chars.len()
            && chars[j].is_ascii_alphanumeric()
            && !chars.get(j + 1).is_some_and(is_word_char);
        if lone_alnum {
            i = j;
        }
    }
    out
}

/// Split on runs of whitespace and commas.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Whether a token has the shape of a device label: 2 to 14 characters of
/// letters, digits, `/` and `-`.
pub fn is_candidate(token: &str) -> bool {
    let len = token.chars().count();
    (MIN_LABEL_LEN..=MAX_LABEL_LEN).contains(&len)
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '-')
}

/// Produce the deduplicated candidate set from a raw text blob.
///
/// Candidates keep the order of their first occurrence so downstream output is stable.
pub fn normalize(blob: &str, options: NormalizeOptions) -> IndexSet<String> {
    let repaired = if options.kerning_repair {
        repair_kerning(blob)
    } else {
        blob.to_string()
    };

    let candidates: IndexSet<String> = tokenize(&repaired)
        .filter(|t| is_candidate(t))
        .map(str::to_string)
        .collect();
    log::debug!("Normalized {} bytes of text into {} candidates", blob.len(), candidates.len());
    candidates
}
