//! Assigns candidate labels to legend categories.
//!
//! A label `L` belongs to category `T` when `L` starts with one of `T`'s match
//! keys (case-insensitively) and what follows the key is non-empty numbering:
//! digits, `/` and `-` only. So key `C` takes `C01` and `C3/4` but not `Cafe`.
//! Categories are tried in list order and the first success wins; keys within
//! a category are tried in their configured order.

use indexmap::IndexMap;

use crate::legend::LegendTemplate;

/// Outcome of matching a whole candidate set.
#[derive(Debug, Default)]
pub struct MatchSet<'t> {
    /// Matched labels with their category, in candidate order.
    pub matched: IndexMap<String, &'t LegendTemplate>,
    /// Labels no category accepted, in candidate order.
    pub unmatched: Vec<String>,
}

impl MatchSet<'_> {
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}

/// Whether the remainder after a match key is device numbering.
pub fn is_numbering(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit() || c == '/' || c == '-')
}

/// The match key of `template` that accepts `label`, if any.
pub fn matching_key<'t>(label: &str, template: &'t LegendTemplate) -> Option<&'t str> {
    let upper = label.to_uppercase();
    template
        .match_keys
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .find(|key| {
            upper
                .strip_prefix(key.to_uppercase().as_str())
                .is_some_and(is_numbering)
        })
}

/// Find the first category, in list order, that accepts `label`.
pub fn match_label<'t>(label: &str, templates: &'t [LegendTemplate]) -> Option<&'t LegendTemplate> {
    templates.iter().find(|t| matching_key(label, t).is_some())
}

/// Match every candidate; unmatched candidates are collected, not treated as errors.
pub fn match_candidates<'t, I, S>(candidates: I, templates: &'t [LegendTemplate]) -> MatchSet<'t>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = MatchSet::default();
    for candidate in candidates {
        let label = candidate.as_ref();
        match match_label(label, templates) {
            Some(template) => {
                set.matched.insert(label.to_string(), template);
            }
            None => {
                log::debug!("No category accepts '{}'", label);
                set.unmatched.push(label.to_string());
            }
        }
    }
    set
}
