//! Legend categories: the device classes a floorplan label can belong to.
//!
//! A category carries its match keys (label prefixes) and the ordered base
//! steps every task group of that class starts with. Category lists are always
//! ordered sequences: the matcher gives the earlier category priority.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EditError;
use crate::fields::Direction;

/// Label of the manual-only category every project keeps.
pub const CUSTOM_LABEL: &str = "Custom";

/// One step of a category's default checklist, before it is instantiated for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStep {
    pub category: String,
    pub task_type: String,
    pub details: String,
    pub product_name: String,
}

impl BaseStep {
    pub fn new(category: &str, task_type: &str, details: &str, product_name: &str) -> Self {
        BaseStep {
            category: category.to_string(),
            task_type: task_type.to_string(),
            details: details.to_string(),
            product_name: product_name.to_string(),
        }
    }
}

/// A configured device class with its matching rules and default checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendTemplate {
    pub id: String,
    pub label: String,
    /// Prefixes compared case-insensitively. Empty means manual-only.
    #[serde(default)]
    pub match_keys: Vec<String>,
    #[serde(default)]
    pub base_sub_tasks: Vec<BaseStep>,
}

impl LegendTemplate {
    /// Whether this category can receive labels automatically.
    pub fn is_auto_matchable(&self) -> bool {
        self.match_keys.iter().any(|k| !k.trim().is_empty())
    }

    pub fn custom() -> Self {
        LegendTemplate {
            id: "custom".into(),
            label: CUSTOM_LABEL.into(),
            match_keys: Vec::new(),
            base_sub_tasks: Vec::new(),
        }
    }
}

/// Find a category by label, ignoring case.
pub fn find_by_label<'a>(templates: &'a [LegendTemplate], label: &str) -> Option<&'a LegendTemplate> {
    templates.iter().find(|t| t.label.eq_ignore_ascii_case(label.trim()))
}

/// Position of a category by label, ignoring case.
pub fn position_by_label(templates: &[LegendTemplate], label: &str) -> Option<usize> {
    templates.iter().position(|t| t.label.eq_ignore_ascii_case(label.trim()))
}

/// Check a category list for duplicate labels and blank match keys.
pub fn validate_templates(templates: &[LegendTemplate]) -> Result<(), EditError> {
    for (i, t) in templates.iter().enumerate() {
        if t.label.trim().is_empty() {
            return Err(EditError::InvalidTemplate(format!("category #{} has no label", i + 1)));
        }
        if t.match_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(EditError::InvalidTemplate(format!("'{}' has a blank match key", t.label)));
        }
        if templates[..i].iter().any(|o| o.label.eq_ignore_ascii_case(&t.label)) {
            return Err(EditError::InvalidTemplate(format!("duplicate category '{}'", t.label)));
        }
    }
    Ok(())
}

/// Make sure the manual-only category is present, appending it if missing.
/// Returns true when the list changed.
pub fn ensure_custom(templates: &mut Vec<LegendTemplate>) -> bool {
    if find_by_label(templates, CUSTOM_LABEL).is_some() {
        return false;
    }
    templates.push(LegendTemplate::custom());
    true
}

/// An edit to an ordered category list (a project's, or the global catalog).
///
/// `index` values are zero-based positions in a category's base steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEdit {
    Create { label: String, keys: Vec<String> },
    AddKey { label: String, key: String },
    AddStep { label: String, task_type: String, details: String, product_name: String },
    /// Change a base step in place; `None` fields keep their value.
    UpdateStep {
        label: String,
        index: usize,
        task_type: Option<String>,
        details: Option<String>,
        product_name: Option<String>,
    },
    RemoveStep { label: String, index: usize },
    MoveStep { label: String, index: usize, direction: Direction },
    /// Move the category itself; list order decides matching ties.
    Move { label: String, direction: Direction },
    Delete { label: String },
}

impl TemplateEdit {
    pub fn is_destructive(&self) -> bool {
        matches!(self, TemplateEdit::RemoveStep { .. } | TemplateEdit::Delete { .. })
    }
}

/// Zero-based index for a 1-based step position as typed by the operator.
pub fn step_index(position: usize) -> Result<usize, EditError> {
    position.checked_sub(1).ok_or(EditError::ZeroPosition)
}

fn lookup<'a>(templates: &'a mut [LegendTemplate], label: &str) -> Result<&'a mut LegendTemplate, EditError> {
    templates
        .iter_mut()
        .find(|t| t.label.eq_ignore_ascii_case(label.trim()))
        .ok_or_else(|| EditError::UnknownCategory(label.to_string()))
}

/// Apply an edit, keeping the list valid. The list is unchanged on error.
pub fn apply_template_edit(
    templates: &mut Vec<LegendTemplate>,
    edit: TemplateEdit,
    confirmed: bool,
) -> Result<(), EditError> {
    if edit.is_destructive() && !confirmed {
        let operation = match edit {
            TemplateEdit::Delete { .. } => "deleting a category",
            _ => "removing a base step",
        };
        return Err(EditError::ConfirmationRequired { operation });
    }

    let mut next = templates.clone();
    match edit {
        TemplateEdit::Create { label, keys } => {
            next.push(LegendTemplate {
                id: Uuid::new_v4().to_string(),
                label: label.trim().to_string(),
                match_keys: keys.iter().map(|k| k.trim().to_string()).collect(),
                base_sub_tasks: Vec::new(),
            });
        }
        TemplateEdit::AddKey { label, key } => {
            let t = lookup(&mut next, &label)?;
            let key = key.trim().to_string();
            if !t.match_keys.iter().any(|k| k.eq_ignore_ascii_case(&key)) {
                t.match_keys.push(key);
            }
        }
        TemplateEdit::AddStep { label, task_type, details, product_name } => {
            let t = lookup(&mut next, &label)?;
            let step = BaseStep::new(&t.label, &task_type, &details, &product_name);
            t.base_sub_tasks.push(step);
        }
        TemplateEdit::UpdateStep { label, index, task_type, details, product_name } => {
            let t = lookup(&mut next, &label)?;
            let step = t
                .base_sub_tasks
                .get_mut(index)
                .ok_or_else(|| EditError::SubTaskNotFound((index + 1).to_string()))?;
            if let Some(task_type) = task_type {
                step.task_type = task_type;
            }
            if let Some(details) = details {
                step.details = details;
            }
            if let Some(product_name) = product_name {
                step.product_name = product_name;
            }
        }
        TemplateEdit::RemoveStep { label, index } => {
            let t = lookup(&mut next, &label)?;
            if index >= t.base_sub_tasks.len() {
                return Err(EditError::SubTaskNotFound((index + 1).to_string()));
            }
            t.base_sub_tasks.remove(index);
        }
        TemplateEdit::MoveStep { label, index, direction } => {
            let t = lookup(&mut next, &label)?;
            if let Some(target) = direction.target(index, t.base_sub_tasks.len()) {
                t.base_sub_tasks.swap(index, target);
            }
        }
        TemplateEdit::Move { label, direction } => {
            let index = position_by_label(&next, &label)
                .ok_or_else(|| EditError::UnknownCategory(label.clone()))?;
            if let Some(target) = direction.target(index, next.len()) {
                next.swap(index, target);
            }
        }
        TemplateEdit::Delete { label } => {
            if label.trim().eq_ignore_ascii_case(CUSTOM_LABEL) {
                return Err(EditError::InvalidTemplate(format!("'{}' cannot be deleted", CUSTOM_LABEL)));
            }
            let index = position_by_label(&next, &label)
                .ok_or_else(|| EditError::UnknownCategory(label.clone()))?;
            next.remove(index);
        }
    }

    validate_templates(&next)?;
    *templates = next;
    Ok(())
}

fn category(id: &str, label: &str, keys: &[&str], steps: &[(&str, &str, &str)]) -> LegendTemplate {
    LegendTemplate {
        id: id.to_string(),
        label: label.to_string(),
        match_keys: keys.iter().map(|k| k.to_string()).collect(),
        base_sub_tasks: steps
            .iter()
            .map(|(task_type, details, product)| BaseStep::new(label, task_type, details, product))
            .collect(),
    }
}

/// The catalog used when no global templates have been saved yet.
pub fn default_templates() -> Vec<LegendTemplate> {
    vec![
        category("1", "Speaker", &["SP", "S"], &[
            ("Pre-Wire", "Rough-in backbox and cabling", "16/2 Oxygen Free Audio Cable"),
            ("Trim", "Install mounting bracket", "Universal Bracket B1"),
            ("Install", "Final installation and trim", "In-Ceiling 6.5\" Speaker"),
            ("Program", "Sound calibration and testing", "N/A"),
        ]),
        category("2", "Data Jacks", &["D", "DATA"], &[
            ("Pre-Wire", "Pull CAT6 cable to location", "CAT6 Blue Plenum"),
            ("Trim", "Terminate and label jack", "RJ45 Keystone Jack"),
            ("Install", "Test connectivity and certify", "N/A"),
        ]),
        category("3", "TV", &["TV", "DISP"], &[
            ("Pre-Wire", "Install wall mount reinforcement", "Plywood Backing"),
            ("Install", "Mount TV and conceal wires", "Sanus VLF728-B2"),
            ("Program", "Configure smart features", "N/A"),
        ]),
        category("4", "In-Wall WAP", &["AP", "WAP"], &[
            ("Pre-Wire", "Install single gang ring", "Low Voltage Ring"),
            ("Install", "Terminate and mount WAP", "Unifi U6-In-Wall"),
            ("Program", "Adopt and configure in controller", "N/A"),
        ]),
        category("5", "Camera", &["C", "CAM"], &[
            ("Pre-Wire", "Cabling and PoE connection", "CAT6"),
            ("Install", "Mount camera and adjust FOV", "IP Security Camera"),
            ("Program", "NVR integration and testing", "N/A"),
        ]),
        category("6", "Contact Sensor", &["CS", "CONT"], &[
            ("Install", "Mount sensor and magnet", "Wireless Contact"),
            ("Program", "Pair with security panel", "Security Hub"),
            ("Single", "Operational trigger test", "N/A"),
        ]),
        category("7", "AV Touchscreen", &["TS", "TP"], &[
            ("Pre-Wire", "Rough-in wall box", "Mounting Plate"),
            ("Install", "Connect network and mount", "Touch Panel 10\""),
            ("Program", "Upload UI and sync project", "N/A"),
        ]),
        category("8", "Motion Detector", &["MD", "MOT"], &[
            ("Install", "Mount at optimal height", "PIR Motion Sensor"),
            ("Program", "Walk test and calibration", "N/A"),
        ]),
        category("9", "Glass Break", &["GB", "GLASS"], &[
            ("Install", "Mount near protected glass", "Acoustic GB Sensor"),
            ("Program", "Frequency response test", "GB Simulator"),
        ]),
        category("10", "Cell Booster", &["CB", "CELL"], &[
            ("Pre-Wire", "Mount external donor antenna", "Yagi Antenna"),
            ("Install", "Install amplifier and internal dome", "Signal Booster Pro"),
            ("Program", "Measure dBi gain", "N/A"),
        ]),
        category("11", "Alarm Keypad", &["KP", "KEY"], &[
            ("Pre-Wire", "Rough-in and bus wiring", "18/4 Shielded"),
            ("Program", "Mount and program zone codes", "LCD Keypad"),
        ]),
        category("12", "VOIP Phone", &["PH", "PHONE"], &[
            ("Pre-Wire", "Cabling and jack termination", "CAT6"),
            ("Program", "Provision and SIP config", "IP Desk Phone"),
        ]),
        category("13", "Shades", &["SH", "SHADE"], &[
            ("Pre-Wire", "Run low-voltage power to window pocket", "16/2 CMP"),
            ("Trim", "Install mounting brackets and cassette", "Shade Brackets"),
            ("Install", "Mount shade roller and terminate power", "Motorized Roller Shade"),
            ("Program", "Set limits and integrate with control system", "N/A"),
        ]),
        LegendTemplate::custom(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid_and_ends_with_custom() {
        let templates = default_templates();
        assert!(validate_templates(&templates).is_ok());
        let last = templates.last().unwrap();
        assert_eq!(last.label, CUSTOM_LABEL);
        assert!(!last.is_auto_matchable());
    }

    #[test]
    fn base_steps_carry_their_category_label() {
        for t in default_templates() {
            assert!(t.base_sub_tasks.iter().all(|s| s.category == t.label));
        }
    }

    #[test]
    fn validation_rejects_blank_keys_and_duplicates() {
        let mut templates = vec![LegendTemplate::custom(), LegendTemplate::custom()];
        assert!(matches!(validate_templates(&templates), Err(EditError::InvalidTemplate(_))));

        templates.truncate(1);
        templates[0].match_keys = vec!["  ".into()];
        assert!(matches!(validate_templates(&templates), Err(EditError::InvalidTemplate(_))));
    }

    #[test]
    fn ensure_custom_is_idempotent() {
        let mut templates = Vec::new();
        assert!(ensure_custom(&mut templates));
        assert!(!ensure_custom(&mut templates));
        assert_eq!(templates.len(), 1);
    }

    #[test]
    fn create_then_fill_a_category() {
        let mut templates = vec![LegendTemplate::custom()];
        let create = TemplateEdit::Create { label: "Projector".into(), keys: vec!["PJ".into()] };
        apply_template_edit(&mut templates, create, false).unwrap();
        let key = TemplateEdit::AddKey { label: "projector".into(), key: "PROJ".into() };
        apply_template_edit(&mut templates, key, false).unwrap();
        let step = TemplateEdit::AddStep {
            label: "Projector".into(),
            task_type: "Install".into(),
            details: "Hang from ceiling mount".into(),
            product_name: "N/A".into(),
        };
        apply_template_edit(&mut templates, step, false).unwrap();

        let t = find_by_label(&templates, "Projector").unwrap();
        assert_eq!(t.match_keys, ["PJ", "PROJ"]);
        assert_eq!(t.base_sub_tasks[0].category, "Projector");
    }

    #[test]
    fn invalid_edits_leave_the_list_unchanged() {
        let mut templates = default_templates();
        let before = templates.clone();
        let dup = TemplateEdit::Create { label: "tv".into(), keys: vec![] };
        assert!(apply_template_edit(&mut templates, dup, false).is_err());
        let blank = TemplateEdit::AddKey { label: "TV".into(), key: " ".into() };
        assert!(apply_template_edit(&mut templates, blank, false).is_err());
        assert_eq!(templates, before);
    }

    #[test]
    fn moving_categories_changes_priority() {
        let mut templates = default_templates();
        let edit = TemplateEdit::Move { label: "Data Jacks".into(), direction: Direction::Up };
        apply_template_edit(&mut templates, edit, false).unwrap();
        assert_eq!(templates[0].label, "Data Jacks");
        assert_eq!(templates[1].label, "Speaker");
    }

    #[test]
    fn moving_steps_swaps_neighbours() {
        let mut templates = default_templates();
        let edit = TemplateEdit::MoveStep { label: "TV".into(), index: 0, direction: Direction::Down };
        apply_template_edit(&mut templates, edit, false).unwrap();
        let types: Vec<_> = find_by_label(&templates, "TV")
            .unwrap()
            .base_sub_tasks
            .iter()
            .map(|s| s.task_type.as_str())
            .collect();
        assert_eq!(types, ["Install", "Pre-Wire", "Program"]);
    }

    #[test]
    fn updating_a_step_keeps_unset_fields() {
        let mut templates = default_templates();
        let edit = TemplateEdit::UpdateStep {
            label: "tv".into(),
            index: 1,
            task_type: None,
            details: Some("Mount and level".into()),
            product_name: Some("Tilt bracket".into()),
        };
        apply_template_edit(&mut templates, edit, false).unwrap();
        let step = &find_by_label(&templates, "TV").unwrap().base_sub_tasks[1];
        assert_eq!(step.task_type, "Install");
        assert_eq!(step.details, "Mount and level");
        assert_eq!(step.product_name, "Tilt bracket");
        assert_eq!(step.category, "TV");

        let before = templates.clone();
        let missing = TemplateEdit::UpdateStep {
            label: "TV".into(),
            index: 9,
            task_type: Some("Trim".into()),
            details: None,
            product_name: None,
        };
        assert_eq!(
            apply_template_edit(&mut templates, missing, false),
            Err(EditError::SubTaskNotFound("10".into()))
        );
        assert_eq!(templates, before);
    }

    #[test]
    fn step_positions_start_at_one() {
        assert_eq!(step_index(1), Ok(0));
        assert_eq!(step_index(3), Ok(2));
        assert_eq!(step_index(0), Err(EditError::ZeroPosition));
    }

    #[test]
    fn deleting_needs_confirmation() {
        let mut templates = default_templates();
        let delete = TemplateEdit::Delete { label: "Shades".into() };
        assert!(matches!(
            apply_template_edit(&mut templates, delete.clone(), false),
            Err(EditError::ConfirmationRequired { .. })
        ));
        apply_template_edit(&mut templates, delete, true).unwrap();
        assert!(find_by_label(&templates, "Shades").is_none());
        let custom = TemplateEdit::Delete { label: "custom".into() };
        assert!(apply_template_edit(&mut templates, custom, true).is_err());

        let rm = TemplateEdit::RemoveStep { label: "TV".into(), index: 7 };
        assert!(apply_template_edit(&mut templates, rm, true).is_err());
    }

    #[test]
    fn templates_round_trip_in_order() {
        let templates = default_templates();
        let json = serde_json::to_string(&templates).unwrap();
        assert!(json.contains("\"matchKeys\""));
        let back: Vec<LegendTemplate> = serde_json::from_str(&json).unwrap();
        let labels: Vec<_> = back.iter().map(|t| t.label.as_str()).collect();
        let expected: Vec<_> = templates.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, expected);
    }
}
