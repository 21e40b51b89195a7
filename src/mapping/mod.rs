//! The map-to-task pipeline.
//!
//! PDF bytes → [`extract`] → raw text → [`normalize`] → candidate labels →
//! [`matcher`] → (label, category) pairs → [`synth`] → task groups.
//!
//! Only extraction can fail. Everything after it is pure: the pipeline never
//! touches project state, callers append the returned tasks themselves.

pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod synth;

use crate::error::ExtractError;
use crate::legend::LegendTemplate;
use crate::task::Task;

pub use normalize::NormalizeOptions;

/// What an import run produced, as the operator should hear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// No candidate labels at all; the document is probably a raster scan.
    NoTextFound,
    /// Candidates were found but no category accepted any of them.
    NoMatches { candidates: usize, example: String },
    /// Some candidates matched and produced task groups.
    Matched { matched: usize, candidates: usize },
}

/// Result of running the pipeline over one document.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Distinct candidate labels found.
    pub candidates: usize,
    /// Candidates no category accepted, in document order.
    pub unmatched: Vec<String>,
    /// Newly synthesized task groups, one per matched candidate.
    pub tasks: Vec<Task>,
}

impl ImportReport {
    pub fn matched(&self) -> usize {
        self.tasks.len()
    }

    pub fn outcome(&self) -> ImportOutcome {
        if self.candidates == 0 {
            ImportOutcome::NoTextFound
        } else if self.tasks.is_empty() {
            ImportOutcome::NoMatches {
                candidates: self.candidates,
                example: self.unmatched.first().cloned().unwrap_or_default(),
            }
        } else {
            ImportOutcome::Matched { matched: self.tasks.len(), candidates: self.candidates }
        }
    }
}

/// Run normalization, matching and synthesis over already-extracted text.
pub fn run_on_text(blob: &str, templates: &[LegendTemplate], options: NormalizeOptions) -> ImportReport {
    let candidates = normalize::normalize(blob, options);
    let matches = matcher::match_candidates(&candidates, templates);
    let tasks = synth::synthesize(&matches);

    log::info!(
        "{} candidates, {} matched, {} unmatched",
        candidates.len(),
        matches.matched.len(),
        matches.unmatched.len()
    );
    ImportReport {
        candidates: candidates.len(),
        unmatched: matches.unmatched,
        tasks,
    }
}

/// Run the whole pipeline over a PDF held in memory.
pub fn run_pipeline(
    bytes: &[u8],
    templates: &[LegendTemplate],
    options: NormalizeOptions,
) -> Result<ImportReport, ExtractError> {
    let blob = extract::extract_text(bytes)?;
    log::info!("Extracted {} characters of text", blob.len());
    Ok(run_on_text(&blob, templates, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::BaseStep;

    fn tpl(label: &str, keys: &[&str], steps: usize) -> LegendTemplate {
        LegendTemplate {
            id: label.into(),
            label: label.into(),
            match_keys: keys.iter().map(|k| k.to_string()).collect(),
            base_sub_tasks: (0..steps)
                .map(|i| BaseStep::new(label, "Install", &format!("step {i}"), "N/A"))
                .collect(),
        }
    }

    #[test]
    fn end_to_end_over_text() {
        let templates = vec![tpl("In-Wall WAP", &["AP", "WAP"], 2), tpl("Data Jacks", &["D", "DATA"], 3)];
        let report = run_on_text("AP1 PH1 D1 D2 S1", &templates, NormalizeOptions::default());

        assert_eq!(report.candidates, 5);
        assert_eq!(report.matched(), 3);
        assert_eq!(report.unmatched, ["PH1", "S1"]);
        assert_eq!(report.outcome(), ImportOutcome::Matched { matched: 3, candidates: 5 });

        let wap: Vec<_> = report.tasks.iter().filter(|t| t.kind == "In-Wall WAP").collect();
        assert_eq!(wap.len(), 1);
        assert_eq!(wap[0].map_id, "AP1");
        let ids: Vec<_> = wap[0].sub_tasks.iter().map(|s| s.sub_task_id.as_str()).collect();
        assert_eq!(ids, ["AP1-01", "AP1-02"]);

        let jacks: Vec<_> = report.tasks.iter().filter(|t| t.kind == "Data Jacks").collect();
        assert_eq!(jacks.iter().map(|t| t.map_id.as_str()).collect::<Vec<_>>(), ["D1", "D2"]);
        assert!(jacks.iter().all(|t| t.sub_tasks.len() == 3));
    }

    #[test]
    fn unmatched_are_counted_not_errors() {
        let templates = vec![tpl("Data Jacks", &["D"], 1)];
        let report = run_on_text("D101 XYZ99", &templates, NormalizeOptions::default());
        assert_eq!(report.matched(), 1);
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.candidates, 2);
    }

    #[test]
    fn empty_text_is_no_text_found() {
        let report = run_on_text("  ", &[tpl("Data Jacks", &["D"], 1)], NormalizeOptions::default());
        assert_eq!(report.outcome(), ImportOutcome::NoTextFound);
    }

    #[test]
    fn candidates_without_matches_give_an_example() {
        let report = run_on_text("LEGEND Q7", &[tpl("Data Jacks", &["D"], 1)], NormalizeOptions::default());
        assert_eq!(
            report.outcome(),
            ImportOutcome::NoMatches { candidates: 2, example: "LEGEND".into() }
        );
    }

    #[test]
    fn parse_failures_abort() {
        let err = run_pipeline(b"not a pdf at all", &[], NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractError::DocumentParse(_)));
    }
}
