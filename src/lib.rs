//! # maptasker
//!
//! Turns architectural floorplans into field checklists. Device labels
//! (`D101`, `AP3`, `SP01`...) are pulled from a PDF's text layer and
//! annotations, matched against configurable legend categories, and each match
//! becomes a task group whose ordered steps technicians complete, photograph
//! and annotate.
//!
//! ```no_run
//! use maptasker::legend::default_templates;
//! use maptasker::mapping::{run_pipeline, ImportOutcome, NormalizeOptions};
//!
//! let bytes = std::fs::read("floorplan.pdf").unwrap();
//! let report = run_pipeline(&bytes, &default_templates(), NormalizeOptions::default()).unwrap();
//! match report.outcome() {
//!     ImportOutcome::NoTextFound => println!("scanned image?"),
//!     ImportOutcome::NoMatches { example, .. } => println!("nothing matched, e.g. {example}"),
//!     ImportOutcome::Matched { matched, candidates } => println!("{matched} of {candidates}"),
//! }
//! ```

pub mod db;
pub mod error;
pub mod fields;
pub mod legend;
pub mod mapping;
pub mod project;
pub mod search;
pub mod settings;
pub mod task;
