//! The project document and the operations that change it.
//!
//! A project is stored as one JSON file holding its task groups and its
//! ordered category list. All mutation goes through `Database` methods; the
//! caller persists with [`Database::save`] once the change is complete, so an
//! abandoned operation leaves the file untouched.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EditError, StoreError};
use crate::fields::ReimportPolicy;
use crate::legend::{ensure_custom, find_by_label, default_templates, LegendTemplate};
use crate::mapping::synth::{instantiate_steps, synthesize_task};
use crate::task::{Comment, SubTask, Task};

/// Category recorded on steps added by hand.
pub const MANUAL_CATEGORY: &str = "Manual";
const AD_HOC_PREFIX: &str = "AD-HOC-";

/// In-memory project: task groups plus the categories used to build them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Ordered: earlier categories win ties when matching.
    #[serde(default)]
    pub templates: Vec<LegendTemplate>,
}

/// An edit to one task group.
///
/// Steps are addressed by display id (`D101-02`), 1-based position, or uuid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEdit {
    /// Switch the group to another category and rebuild its checklist from that
    /// category's base steps. Completion, comments and photos on the old steps are lost.
    ReplaceSubTasks { category: String },
    /// Add an ad-hoc step at the end of the checklist.
    AppendSubTask { task_type: String, details: String, product_name: Option<String> },
    /// Change a step's type, details or product; `None` fields keep their value.
    UpdateSubTask {
        step: String,
        task_type: Option<String>,
        details: Option<String>,
        product_name: Option<String>,
    },
    RemoveSubTask { step: String },
    /// Move a step to the position currently held by `target`.
    MoveSubTask { step: String, target: String },
    SetCompleted { step: String, done: bool },
    /// Comment on a step, or on the group itself when `step` is `None`.
    Comment { step: Option<String>, user: String, text: String },
    AttachPhoto { step: Option<String>, reference: String },
    /// Remove the photo at zero-based `index`.
    RemovePhoto { step: Option<String>, index: usize },
}

impl TaskEdit {
    /// Edits that discard recorded work need explicit confirmation.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            TaskEdit::ReplaceSubTasks { .. } | TaskEdit::RemoveSubTask { .. } | TaskEdit::RemovePhoto { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskEdit::ReplaceSubTasks { .. } => "changing the category",
            TaskEdit::AppendSubTask { .. } => "adding a step",
            TaskEdit::UpdateSubTask { .. } => "editing a step",
            TaskEdit::RemoveSubTask { .. } => "removing a step",
            TaskEdit::MoveSubTask { .. } => "moving a step",
            TaskEdit::SetCompleted { .. } => "updating a step",
            TaskEdit::Comment { .. } => "commenting",
            TaskEdit::AttachPhoto { .. } => "attaching a photo",
            TaskEdit::RemovePhoto { .. } => "removing a photo",
        }
    }
}

/// What appending an import did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportApplied {
    pub added: usize,
    /// Labels left alone because the project already had them.
    pub skipped: Vec<String>,
}

/// Per-category progress figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStats {
    pub label: String,
    pub tasks: usize,
    pub steps_done: usize,
    pub steps_total: usize,
}

impl CategoryStats {
    pub fn percent(&self) -> u32 {
        if self.steps_total == 0 {
            0
        } else {
            ((self.steps_done * 100) / self.steps_total) as u32
        }
    }
}

/// Write `data` to `path` via a temp file and rename.
pub fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    let tmp = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    };
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    Ok(())
}

impl Database {
    /// A new, empty project using the given category list.
    pub fn new(name: &str, description: &str, templates: Vec<LegendTemplate>) -> Self {
        let mut db = Database {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            created_at_utc: Utc::now().timestamp(),
            tasks: Vec::new(),
            templates,
        };
        db.migrate();
        db
    }

    /// Load a project file, applying migrations for older files.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path)?;
        let mut db: Database = serde_json::from_str(&raw)?;
        if db.migrate() {
            log::info!("Migrated category list of project '{}'", db.name);
        }
        Ok(db)
    }

    /// Save the project atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(self)?;
        write_atomic(path, &data)?;
        Ok(())
    }

    /// Projects without categories get the default catalog; every project keeps a `Custom` category.
    fn migrate(&mut self) -> bool {
        let mut changed = false;
        if self.templates.is_empty() {
            self.templates = default_templates();
            changed = true;
        }
        changed |= ensure_custom(&mut self.templates);
        changed
    }

    /// The ordered category list used for matching.
    pub fn list_templates(&self) -> &[LegendTemplate] {
        &self.templates
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Resolve a task identifier (uuid or floorplan label) to a task id.
    /// Labels are compared case-insensitively; a label naming several groups is an error.
    pub fn resolve_task(&self, identifier: &str) -> Result<Uuid, EditError> {
        let identifier = identifier.trim();
        if let Ok(id) = Uuid::parse_str(identifier) {
            return self
                .get(id)
                .map(|t| t.id)
                .ok_or_else(|| EditError::TaskNotFound(identifier.to_string()));
        }

        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.map_id.eq_ignore_ascii_case(identifier))
            .collect();
        match matches.as_slice() {
            [] => Err(EditError::TaskNotFound(identifier.to_string())),
            [only] => Ok(only.id),
            many => Err(EditError::AmbiguousTask {
                label: identifier.to_string(),
                ids: many.iter().map(|t| t.id.to_string()).collect(),
            }),
        }
    }

    /// Append freshly synthesized groups in one step, honoring the reimport policy.
    pub fn apply_import(&mut self, tasks: Vec<Task>, policy: ReimportPolicy) -> ImportApplied {
        let mut applied = ImportApplied::default();
        let mut accepted = Vec::with_capacity(tasks.len());
        for task in tasks {
            let exists = self.tasks.iter().any(|t| t.map_id == task.map_id);
            if policy == ReimportPolicy::SkipExisting && exists {
                applied.skipped.push(task.map_id);
            } else {
                accepted.push(task);
            }
        }
        applied.added = accepted.len();
        self.tasks.extend(accepted);
        applied
    }

    /// Add a task group for `label` in a named category, without match-key checks.
    pub fn add_task(&mut self, label: &str, category: &str) -> Result<Uuid, EditError> {
        let template = find_by_label(&self.templates, category)
            .ok_or_else(|| EditError::UnknownCategory(category.to_string()))?;
        let task = synthesize_task(label.trim(), template, Utc::now().timestamp());
        let id = task.id;
        self.tasks.push(task);
        Ok(id)
    }

    /// Delete a whole task group with all its steps.
    pub fn remove_task(&mut self, id: Uuid, confirmed: bool) -> Result<Task, EditError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| EditError::TaskNotFound(id.to_string()))?;
        if !confirmed {
            return Err(EditError::ConfirmationRequired { operation: "deleting a task group" });
        }
        Ok(self.tasks.remove(idx))
    }

    /// Apply an edit to one task group. Destructive edits fail unless `confirmed`.
    pub fn apply_edit(&mut self, id: Uuid, edit: TaskEdit, confirmed: bool) -> Result<(), EditError> {
        // Resolve the category before borrowing the task mutably.
        let replacement = match &edit {
            TaskEdit::ReplaceSubTasks { category } => Some(
                find_by_label(&self.templates, category)
                    .cloned()
                    .ok_or_else(|| EditError::UnknownCategory(category.clone()))?,
            ),
            _ => None,
        };
        let task = self.get_mut(id).ok_or_else(|| EditError::TaskNotFound(id.to_string()))?;

        if let Some(template) = &replacement {
            if task.kind == template.label {
                return Ok(());
            }
        }
        if edit.is_destructive() && !confirmed {
            return Err(EditError::ConfirmationRequired { operation: edit.name() });
        }

        let now = Utc::now().timestamp();
        match edit {
            TaskEdit::ReplaceSubTasks { .. } => {
                if let Some(template) = replacement {
                    task.sub_tasks = instantiate_steps(&task.map_id, &template);
                    task.kind = template.label;
                }
            }
            TaskEdit::AppendSubTask { task_type, details, product_name } => {
                let step = SubTask {
                    id: Uuid::new_v4(),
                    sub_task_id: next_ad_hoc_id(task),
                    category: MANUAL_CATEGORY.to_string(),
                    task_type,
                    details,
                    product_name: product_name
                        .filter(|p| !p.trim().is_empty())
                        .unwrap_or_else(|| "N/A".to_string()),
                    is_completed: false,
                    comments: Vec::new(),
                    photos: Vec::new(),
                };
                task.sub_tasks.push(step);
            }
            TaskEdit::UpdateSubTask { step, task_type, details, product_name } => {
                let idx = find_step(task, &step)?;
                let sub = &mut task.sub_tasks[idx];
                if let Some(task_type) = task_type {
                    sub.task_type = task_type;
                }
                if let Some(details) = details {
                    sub.details = details;
                }
                if let Some(product_name) = product_name {
                    sub.product_name = product_name;
                }
            }
            TaskEdit::RemoveSubTask { step } => {
                let idx = find_step(task, &step)?;
                task.sub_tasks.remove(idx);
            }
            TaskEdit::MoveSubTask { step, target } => {
                let from = find_step(task, &step)?;
                let to = find_step(task, &target)?;
                let moved = task.sub_tasks.remove(from);
                task.sub_tasks.insert(to, moved);
            }
            TaskEdit::SetCompleted { step, done } => {
                let idx = find_step(task, &step)?;
                task.sub_tasks[idx].is_completed = done;
            }
            TaskEdit::Comment { step, user, text } => {
                let comment = Comment::new(&user, &text, now);
                match step {
                    Some(step) => {
                        let idx = find_step(task, &step)?;
                        task.sub_tasks[idx].comments.push(comment);
                    }
                    None => task.comments.push(comment),
                }
            }
            TaskEdit::AttachPhoto { step, reference } => {
                photos_mut(task, step.as_deref())?.push(reference);
            }
            TaskEdit::RemovePhoto { step, index } => {
                let photos = photos_mut(task, step.as_deref())?;
                if index >= photos.len() {
                    return Err(EditError::PhotoNotFound(index));
                }
                photos.remove(index);
            }
        }
        Ok(())
    }

    /// Progress per category, in category-list order, followed by any types no longer in the list.
    pub fn category_summary(&self) -> Vec<CategoryStats> {
        let mut stats: Vec<CategoryStats> = Vec::new();
        let order = self.templates.iter().map(|t| t.label.as_str());
        let extra = self.tasks.iter().map(|t| t.kind.as_str());
        for label in order.chain(extra) {
            if stats.iter().any(|s| s.label == label) {
                continue;
            }
            let mut s = CategoryStats { label: label.to_string(), tasks: 0, steps_done: 0, steps_total: 0 };
            for t in self.tasks.iter().filter(|t| t.kind == label) {
                let (done, total) = t.progress();
                s.tasks += 1;
                s.steps_done += done;
                s.steps_total += total;
            }
            if s.tasks > 0 {
                stats.push(s);
            }
        }
        stats
    }
}

/// Position of a step addressed by uuid, display id, or 1-based position.
pub fn find_step(task: &Task, step: &str) -> Result<usize, EditError> {
    let step = step.trim();
    if let Ok(id) = Uuid::parse_str(step) {
        if let Some(i) = task.sub_tasks.iter().position(|s| s.id == id) {
            return Ok(i);
        }
    }
    if let Some(i) = task.sub_tasks.iter().position(|s| s.sub_task_id.eq_ignore_ascii_case(step)) {
        return Ok(i);
    }
    match step.parse::<usize>() {
        Ok(n) if n >= 1 && n <= task.sub_tasks.len() => Ok(n - 1),
        _ => Err(EditError::SubTaskNotFound(step.to_string())),
    }
}

fn photos_mut<'a>(task: &'a mut Task, step: Option<&str>) -> Result<&'a mut Vec<String>, EditError> {
    match step {
        Some(step) => {
            let idx = find_step(task, step)?;
            Ok(&mut task.sub_tasks[idx].photos)
        }
        None => Ok(&mut task.photos),
    }
}

/// `AD-HOC-<n>` with `n` one past the highest ad-hoc number already in the group.
fn next_ad_hoc_id(task: &Task) -> String {
    let highest = task
        .sub_tasks
        .iter()
        .filter_map(|s| s.sub_task_id.strip_prefix(AD_HOC_PREFIX))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{}", AD_HOC_PREFIX, highest + 1)
}
