use proptest::prelude::*;

use maptasker::legend::default_templates;
use maptasker::mapping::matcher::{match_candidates, match_label};
use maptasker::mapping::normalize::{is_candidate, normalize};
use maptasker::mapping::NormalizeOptions;

const PLAIN: NormalizeOptions = NormalizeOptions { kerning_repair: false };

proptest! {
    #[test]
    fn normalizing_candidates_again_changes_nothing(blob in "[A-Za-z0-9 ,/\\-\n]{0,80}") {
        let first = normalize(&blob, PLAIN);
        let rejoined = first.iter().cloned().collect::<Vec<_>>().join(" ");
        let second = normalize(&rejoined, PLAIN);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn whole_labels_survive_kerning_repair(labels in prop::collection::vec("[A-Z]{1,3}[0-9]{1,4}", 1..12)) {
        let blob = labels.join(" ");
        let repaired = normalize(&blob, NormalizeOptions::default());
        let plain = normalize(&blob, PLAIN);
        prop_assert_eq!(repaired, plain);
    }

    #[test]
    fn every_candidate_has_label_shape(blob in "\\PC{0,120}") {
        for candidate in normalize(&blob, NormalizeOptions::default()) {
            prop_assert!(is_candidate(&candidate), "bad candidate {:?}", candidate);
        }
    }

    #[test]
    fn candidate_order_does_not_change_assignments(labels in prop::collection::vec("(SP|S|D|AP|TV|CS|C|KP|XX)[0-9]{1,3}", 0..20)) {
        let templates = default_templates();
        let forward = match_candidates(&labels, &templates);
        let reversed: Vec<&String> = labels.iter().rev().collect();
        let backward = match_candidates(reversed, &templates);

        prop_assert_eq!(forward.matched.len(), backward.matched.len());
        for (label, template) in &forward.matched {
            let other = backward.matched.get(label).map(|t| t.label.as_str());
            prop_assert_eq!(Some(template.label.as_str()), other);
            prop_assert_eq!(match_label(label, &templates).map(|t| t.id.as_str()), Some(template.id.as_str()));
        }
    }
}
