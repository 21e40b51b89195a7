//! Builds task groups for matched labels.
//!
//! Each group gets one sub-task per base step of its category, in template
//! order, with a positional display id `{label}-{NN}`.

use chrono::Utc;
use uuid::Uuid;

use crate::legend::LegendTemplate;
use crate::mapping::matcher::MatchSet;
use crate::task::{SubTask, Task};

/// Display id of the step at zero-based `index` of the group for `map_id`.
pub fn sub_task_id(map_id: &str, index: usize) -> String {
    format!("{}-{:02}", map_id, index + 1)
}

/// Fresh sub-tasks for `map_id` from a category's base steps.
pub fn instantiate_steps(map_id: &str, template: &LegendTemplate) -> Vec<SubTask> {
    template
        .base_sub_tasks
        .iter()
        .enumerate()
        .map(|(idx, step)| SubTask {
            id: Uuid::new_v4(),
            sub_task_id: sub_task_id(map_id, idx),
            category: step.category.clone(),
            task_type: step.task_type.clone(),
            details: step.details.clone(),
            product_name: step.product_name.clone(),
            is_completed: false,
            comments: Vec::new(),
            photos: Vec::new(),
        })
        .collect()
}

/// A new task group for `label` in `template`'s category.
pub fn synthesize_task(label: &str, template: &LegendTemplate, created_at_utc: i64) -> Task {
    Task {
        id: Uuid::new_v4(),
        map_id: label.to_string(),
        name: label.to_string(),
        kind: template.label.clone(),
        sub_tasks: instantiate_steps(label, template),
        created_at_utc,
        comments: Vec::new(),
        photos: Vec::new(),
    }
}

/// One task group per matched label, in match order.
pub fn synthesize(matches: &MatchSet<'_>) -> Vec<Task> {
    let now = Utc::now().timestamp();
    matches
        .matched
        .iter()
        .map(|(label, template)| synthesize_task(label, template, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::BaseStep;
    use crate::mapping::matcher::match_candidates;

    fn data_jacks() -> LegendTemplate {
        LegendTemplate {
            id: "2".into(),
            label: "Data Jacks".into(),
            match_keys: vec!["D".into()],
            base_sub_tasks: vec![
                BaseStep::new("Data Jacks", "Pre-Wire", "Pull CAT6", "CAT6"),
                BaseStep::new("Data Jacks", "Trim", "Terminate", "RJ45"),
                BaseStep::new("Data Jacks", "Install", "Certify", "N/A"),
            ],
        }
    }

    #[test]
    fn sub_task_ids_are_positional_and_zero_padded() {
        let task = synthesize_task("D101", &data_jacks(), 0);
        let ids: Vec<_> = task.sub_tasks.iter().map(|s| s.sub_task_id.as_str()).collect();
        assert_eq!(ids, ["D101-01", "D101-02", "D101-03"]);
        assert_eq!(sub_task_id("D1", 11), "D1-12");
        assert_eq!(sub_task_id("D1", 99), "D1-100");
    }

    #[test]
    fn steps_copy_template_fields_in_order() {
        let template = data_jacks();
        let task = synthesize_task("D7", &template, 42);
        assert_eq!(task.kind, "Data Jacks");
        assert_eq!(task.map_id, "D7");
        assert_eq!(task.name, "D7");
        assert_eq!(task.created_at_utc, 42);
        for (step, base) in task.sub_tasks.iter().zip(&template.base_sub_tasks) {
            assert_eq!(step.category, base.category);
            assert_eq!(step.task_type, base.task_type);
            assert_eq!(step.details, base.details);
            assert_eq!(step.product_name, base.product_name);
            assert!(!step.is_completed);
            assert!(step.comments.is_empty() && step.photos.is_empty());
        }
        assert!(task.comments.is_empty() && task.photos.is_empty());
    }

    #[test]
    fn every_step_gets_a_fresh_id() {
        let a = synthesize_task("D1", &data_jacks(), 0);
        let b = synthesize_task("D1", &data_jacks(), 0);
        assert_ne!(a.id, b.id);
        let mut ids: Vec<_> = a.sub_tasks.iter().chain(&b.sub_tasks).map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn category_without_steps_yields_empty_checklist() {
        let task = synthesize_task("X1", &LegendTemplate::custom(), 0);
        assert!(task.sub_tasks.is_empty());
        assert_eq!(task.kind, "Custom");
    }

    #[test]
    fn synthesizes_in_match_order_and_leaves_templates_untouched() {
        let templates = vec![data_jacks()];
        let before = templates.clone();
        let matches = match_candidates(["D2", "Q1", "D1"], &templates);
        let tasks = synthesize(&matches);
        let labels: Vec<_> = tasks.iter().map(|t| t.map_id.as_str()).collect();
        assert_eq!(labels, ["D2", "D1"]);
        assert_eq!(templates, before);
    }

    #[test]
    fn no_matches_no_tasks() {
        let templates = vec![data_jacks()];
        let matches = match_candidates(["Q1"], &templates);
        assert!(synthesize(&matches).is_empty());
    }
}
