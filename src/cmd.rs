//! Command implementations for the CLI interface.
//!
//! Handlers print results to stdout and report failures on stderr with exit
//! status 1. Operations that discard recorded work ask for confirmation unless
//! `--yes` is given.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use uuid::Uuid;

use maptasker::db::{Database, TaskEdit};
use maptasker::error::EditError;
use maptasker::fields::Direction;
use maptasker::legend::{apply_template_edit, step_index, LegendTemplate, TemplateEdit};
use maptasker::mapping::{run_pipeline, ImportOutcome, ImportReport, NormalizeOptions};
use maptasker::project::{create_backup, create_project, discover_projects, Project};
use maptasker::search::{search_projects, HitKind};
use maptasker::settings::{load_global_templates, save_global_templates, Settings};
use maptasker::task::{Comment, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// Create or delete projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// List projects in the data directory.
    Projects,

    /// Search all projects for a label, step text or product.
    Search {
        query: String,
        /// Maximum number of hits to show.
        #[arg(long, default_value_t = 8)]
        limit: usize,
    },

    /// Import a floorplan PDF and create task groups for every matched label.
    Import {
        /// Path to the PDF floorplan
        pdf: PathBuf,
    },

    /// Dry run: report what an import would match without changing the project.
    Check {
        /// Path to the PDF floorplan
        pdf: PathBuf,
    },

    /// List task groups with progress.
    List {
        /// Only groups of this category.
        #[arg(long = "type")]
        kind: Option<String>,
        /// Hide completed groups.
        #[arg(long)]
        open: bool,
        /// Show each group's steps underneath it.
        #[arg(long)]
        tree: bool,
    },

    /// Show one task group with its steps, comments and photos.
    View {
        /// Floorplan label (e.g. D101) or task id
        task: String,
    },

    /// Add a task group by hand from a named category.
    Add {
        /// Floorplan label for the new group
        label: String,
        #[arg(long, default_value = "Custom")]
        category: String,
    },

    /// Switch a task group to another category, rebuilding its steps.
    Retype {
        /// Floorplan label or task id
        task: String,
        /// New category label
        category: String,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Edit the steps of a task group.
    Step {
        #[command(subcommand)]
        action: StepAction,
    },

    /// Comment on a task group or one of its steps.
    Comment {
        /// Floorplan label or task id
        task: String,
        text: String,
        /// Step id (D101-02), position, or uuid. Omit to comment on the group.
        #[arg(long)]
        step: Option<String>,
        /// Author name (defaults to the configured operator).
        #[arg(long)]
        user: Option<String>,
    },

    /// Attach or remove photo references.
    Photo {
        #[command(subcommand)]
        action: PhotoAction,
    },

    /// Delete a task group with all its steps.
    Delete {
        /// Floorplan label or task id
        task: String,
        #[arg(long, short)]
        yes: bool,
    },

    /// Manage legend categories.
    Template {
        /// Operate on the global catalog new projects start from.
        #[arg(long, global = true)]
        global: bool,
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Per-category progress for the project.
    Status,

    /// Create a timestamped backup of the current project.
    Backup,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project from the global category catalog.
    New {
        name: String,
        #[arg(long)]
        desc: Option<String>,
    },
    /// Delete a project and its stored map. A backup of the project file is kept.
    Rm {
        name: String,
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum StepAction {
    /// Append an ad-hoc step.
    Add {
        task: String,
        #[arg(long)]
        task_type: String,
        #[arg(long)]
        details: String,
        #[arg(long)]
        product: Option<String>,
    },
    /// Change a step's type, details or product.
    Edit {
        task: String,
        step: String,
        #[arg(long)]
        task_type: Option<String>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long)]
        product: Option<String>,
    },
    /// Remove a step.
    Rm {
        task: String,
        step: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Move a step to where another step currently is.
    Move { task: String, step: String, target: String },
    /// Mark a step completed.
    Done { task: String, step: String },
    /// Mark a step not completed.
    Undo { task: String, step: String },
}

#[derive(Subcommand)]
pub enum PhotoAction {
    /// Attach a photo reference (path or URL).
    Add {
        task: String,
        reference: String,
        #[arg(long)]
        step: Option<String>,
    },
    /// Remove the photo at a 1-based position.
    Rm {
        task: String,
        position: usize,
        #[arg(long)]
        step: Option<String>,
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// List categories in matching order.
    List,
    /// Create a category.
    New {
        label: String,
        /// Match key (label prefix). May be repeated.
        #[arg(long = "key")]
        keys: Vec<String>,
    },
    /// Add a match key to a category.
    Key { label: String, key: String },
    /// Append a base step to a category.
    Step {
        label: String,
        #[arg(long)]
        task_type: String,
        #[arg(long)]
        details: String,
        #[arg(long, default_value = "N/A")]
        product: String,
    },
    /// Change the base step at a 1-based position.
    EditStep {
        label: String,
        position: usize,
        #[arg(long)]
        task_type: Option<String>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long)]
        product: Option<String>,
    },
    /// Remove the base step at a 1-based position.
    RmStep {
        label: String,
        position: usize,
        #[arg(long, short)]
        yes: bool,
    },
    /// Move a base step up or down.
    MoveStep {
        label: String,
        position: usize,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Move a category up or down; earlier categories win when keys overlap.
    Move {
        label: String,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Delete a category.
    Delete {
        label: String,
        #[arg(long, short)]
        yes: bool,
    },
}

impl TemplateAction {
    /// The list edit this action performs, or `None` for `list`.
    fn edit(&self) -> Result<Option<(TemplateEdit, bool)>, EditError> {
        let edit = match self {
            TemplateAction::List => return Ok(None),
            TemplateAction::New { label, keys } => {
                (TemplateEdit::Create { label: label.clone(), keys: keys.clone() }, false)
            }
            TemplateAction::Key { label, key } => {
                (TemplateEdit::AddKey { label: label.clone(), key: key.clone() }, false)
            }
            TemplateAction::Step { label, task_type, details, product } => (
                TemplateEdit::AddStep {
                    label: label.clone(),
                    task_type: task_type.clone(),
                    details: details.clone(),
                    product_name: product.clone(),
                },
                false,
            ),
            TemplateAction::EditStep { label, position, task_type, details, product } => (
                TemplateEdit::UpdateStep {
                    label: label.clone(),
                    index: step_index(*position)?,
                    task_type: task_type.clone(),
                    details: details.clone(),
                    product_name: product.clone(),
                },
                false,
            ),
            TemplateAction::RmStep { label, position, yes } => (
                TemplateEdit::RemoveStep { label: label.clone(), index: step_index(*position)? },
                *yes,
            ),
            TemplateAction::MoveStep { label, position, direction } => (
                TemplateEdit::MoveStep {
                    label: label.clone(),
                    index: step_index(*position)?,
                    direction: *direction,
                },
                false,
            ),
            TemplateAction::Move { label, direction } => {
                (TemplateEdit::Move { label: label.clone(), direction: *direction }, false)
            }
            TemplateAction::Delete { label, yes } => (TemplateEdit::Delete { label: label.clone() }, *yes),
        };
        Ok(Some(edit))
    }
}

/// Ask a yes/no question on stdin. Anything but `y...` is no.
fn confirm(question: &str) -> bool {
    print!("{} (y/N): ", question);
    let _ = io::stdout().flush();

    let mut response = String::new();
    io::stdin().read_line(&mut response).is_ok() && response.trim().to_lowercase().starts_with('y')
}

/// Run `op`, asking once for confirmation if it reports that it needs one.
/// Returns `None` when the operator declines.
fn with_confirmation<T>(yes: bool, mut op: impl FnMut(bool) -> Result<T, EditError>) -> Option<T> {
    match op(yes) {
        Err(EditError::ConfirmationRequired { operation }) => {
            if !confirm(&format!("{} discards recorded work. Continue?", operation)) {
                println!("Cancelled.");
                return None;
            }
            match op(true) {
                Ok(v) => Some(v),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Ok(v) => Some(v),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn save_db(db: &Database, project: &Project) {
    if let Err(e) = db.save(&project.file_path) {
        eprintln!("Failed to save project: {}", e);
        std::process::exit(1);
    }
}

fn resolve(db: &Database, task: &str) -> Uuid {
    match db.resolve_task(task) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving task: {}", e);
            std::process::exit(1);
        }
    }
}

fn format_utc(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn normalize_options(settings: &Settings) -> NormalizeOptions {
    NormalizeOptions { kerning_repair: settings.kerning_repair }
}

/// Keys of all auto-matching categories, for the "nothing matched" hint.
fn configured_keys(templates: &[LegendTemplate]) -> String {
    let keys: Vec<&str> = templates
        .iter()
        .flat_map(|t| t.match_keys.iter())
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        "(none)".into()
    } else {
        keys.join(", ")
    }
}

fn print_outcome(report: &ImportReport, templates: &[LegendTemplate]) {
    match report.outcome() {
        ImportOutcome::NoTextFound => {
            println!("No text found in PDF. This might be a scanned image.");
        }
        ImportOutcome::NoMatches { candidates, example } => {
            println!(
                "Found {} text items, but none matched your Legend Keys. Example found: \"{}\". Your Keys: {}",
                candidates,
                example,
                configured_keys(templates)
            );
        }
        ImportOutcome::Matched { matched, candidates } => {
            println!("Matched {} of {} labels.", matched, candidates);
            if !report.unmatched.is_empty() {
                log::info!("Unmatched: {}", report.unmatched.join(", "));
            }
        }
    }
}

/// Create a project seeded from the global catalog.
pub fn cmd_project_new(dir: &Path, name: String, desc: Option<String>) {
    let templates = match load_global_templates(dir) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read global templates: {}", e);
            std::process::exit(1);
        }
    };
    match create_project(&name, desc.as_deref().unwrap_or(""), templates, dir) {
        Ok(project) => println!("Created project '{}' ({})", project.display_name, project.file_path.display()),
        Err(e) => {
            eprintln!("Failed to create project: {}", e);
            std::process::exit(1);
        }
    }
}

/// Delete a project after confirmation, keeping a backup of its file.
pub fn cmd_project_rm(dir: &Path, name: String, yes: bool) {
    let project = Project::new(&name, dir);
    if !project.exists() {
        eprintln!("Project '{}' not found.", name);
        std::process::exit(1);
    }
    if !yes && !confirm(&format!("Delete project '{}' with all its task groups?", name)) {
        println!("Cancelled.");
        return;
    }
    match create_backup(&project.file_path) {
        Ok(path) => println!("Created backup: {}", path.display()),
        Err(e) => {
            eprintln!("Failed to create backup: {}", e);
            std::process::exit(1);
        }
    }
    if let Err(e) = project.delete() {
        eprintln!("Failed to delete project: {}", e);
        std::process::exit(1);
    }
    println!("Deleted project '{}'.", name);
}

pub fn cmd_search(dir: &Path, query: String, limit: usize) {
    if query.trim().is_empty() {
        eprintln!("Search query cannot be empty.");
        std::process::exit(1);
    }
    let hits = match search_projects(dir, &query) {
        Ok(hits) => hits,
        Err(e) => {
            eprintln!("Failed to search {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    };
    if hits.is_empty() {
        println!("No matches for '{}'.", query.trim());
        return;
    }
    for hit in hits.iter().take(limit) {
        let kind = match hit.kind {
            HitKind::Project => "project",
            HitKind::Task => "task",
            HitKind::Step => "step",
        };
        println!("{:<8} {:<40} {}", kind, truncate(&hit.title, 40), hit.subtitle);
    }
    if hits.len() > limit {
        println!("... {} more (use --limit)", hits.len() - limit);
    }
}

pub fn cmd_projects(dir: &Path, current: Option<&Project>) {
    let projects = match discover_projects(dir) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to read {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    };
    if projects.is_empty() {
        println!("No projects found. Create one with `mt project new <name>`.");
        return;
    }
    println!("  {:<24} {:>6}", "Project", "Tasks");
    for p in projects {
        let marker = if current.is_some_and(|c| c.name == p.name) { '*' } else { ' ' };
        let tasks = p.load_database().map(|db| db.tasks.len().to_string()).unwrap_or_else(|_| "?".into());
        println!("{} {:<24} {:>6}", marker, truncate(&p.display_name, 24), tasks);
    }
}

/// Import a floorplan into the project: store it, run the pipeline and append
/// the new task groups in a single save.
pub fn cmd_import(project: &Project, settings: &Settings, pdf: &Path) {
    let lock = match project.lock_import() {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let result = import_locked(project, settings, pdf);
    drop(lock);

    if let Err(message) = result {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

fn import_locked(project: &Project, settings: &Settings, pdf: &Path) -> Result<(), String> {
    let mut db = project.load_database().map_err(|e| format!("Failed to load project: {}", e))?;
    let bytes = fs::read(pdf).map_err(|e| format!("Failed to read '{}': {}", pdf.display(), e))?;
    project.put_map(&bytes).map_err(|e| format!("Failed to store map: {}", e))?;

    let report = run_pipeline(&bytes, db.list_templates(), normalize_options(settings))
        .map_err(|e| format!("Failed to read '{}': {}", pdf.display(), e))?;
    print_outcome(&report, db.list_templates());
    if report.tasks.is_empty() {
        return Ok(());
    }

    if settings.backup_before_import {
        match create_backup(&project.file_path) {
            Ok(path) => println!("Created backup: {}", path.display()),
            Err(e) => {
                eprintln!("Warning: Failed to create backup: {}", e);
                if !confirm("Continue without backup?") {
                    println!("Import cancelled.");
                    return Ok(());
                }
            }
        }
    }

    let applied = db.apply_import(report.tasks, settings.reimport_policy);
    db.save(&project.file_path).map_err(|e| format!("Failed to save project: {}", e))?;

    if !applied.skipped.is_empty() {
        println!(
            "Skipped {} label(s) already in the project: {}",
            applied.skipped.len(),
            applied.skipped.join(", ")
        );
    }
    println!("Added {} task group(s) to '{}'.", applied.added, project.display_name);
    Ok(())
}

/// Run the pipeline against a PDF and report, without touching any project file.
pub fn cmd_check(templates: &[LegendTemplate], settings: &Settings, pdf: &Path) {
    let bytes = match fs::read(pdf) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", pdf.display(), e);
            std::process::exit(1);
        }
    };
    let report = match run_pipeline(&bytes, templates, normalize_options(settings)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", pdf.display(), e);
            std::process::exit(1);
        }
    };
    print_outcome(&report, templates);

    for task in &report.tasks {
        println!("  {:<12} {:<18} {} step(s)", task.map_id, truncate(&task.kind, 18), task.sub_tasks.len());
    }
    if !report.unmatched.is_empty() {
        println!("Unmatched: {}", report.unmatched.join(", "));
    }
}

pub fn cmd_list(db: &Database, kind: Option<String>, open: bool, tree: bool) {
    let tasks: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| kind.as_ref().map_or(true, |k| t.kind.eq_ignore_ascii_case(k.trim())))
        .filter(|t| !open || !t.is_complete())
        .collect();

    if tasks.is_empty() {
        println!("No task groups.");
        return;
    }

    println!("{:<12} {:<18} {:>7}  {}", "Label", "Category", "Done", "ID");
    for t in tasks {
        let (done, total) = t.progress();
        println!(
            "{:<12} {:<18} {:>7}  {}",
            truncate(&t.map_id, 12),
            truncate(&t.kind, 18),
            format!("{}/{}", done, total),
            t.id
        );
        if tree {
            for s in &t.sub_tasks {
                let mark = if s.is_completed { 'x' } else { ' ' };
                println!("  [{}] {:<12} {:<10} {}", mark, s.sub_task_id, s.task_type, s.details);
            }
        }
    }
}

fn print_comments(comments: &[Comment], indent: &str) {
    for c in comments {
        println!("{}> {} ({}): {}", indent, c.user, format_utc(c.timestamp_utc), c.text);
    }
}

fn print_photos(photos: &[String], indent: &str) {
    for (i, p) in photos.iter().enumerate() {
        println!("{}photo {}: {}", indent, i + 1, p);
    }
}

pub fn cmd_view(db: &Database, task: String) {
    let id = resolve(db, &task);
    let Some(task) = db.get(id) else {
        eprintln!("Task {} not found.", id);
        std::process::exit(1);
    };

    let (done, total) = task.progress();
    println!("ID:           {}", task.id);
    println!("Label:        {}", task.map_id);
    println!("Category:     {}", task.kind);
    println!("Progress:     {}/{}", done, total);
    println!("Created UTC:  {}", format_utc(task.created_at_utc));
    print_comments(&task.comments, "  ");
    print_photos(&task.photos, "  ");

    println!("Steps:");
    for (i, s) in task.sub_tasks.iter().enumerate() {
        let mark = if s.is_completed { 'x' } else { ' ' };
        println!("{:>3}. [{}] {:<12} {:<10} {}", i + 1, mark, s.sub_task_id, s.task_type, s.details);
        println!("            product: {}", s.product_name);
        print_comments(&s.comments, "            ");
        print_photos(&s.photos, "            ");
    }
}

pub fn cmd_add(db: &mut Database, project: &Project, label: String, category: String) {
    if label.trim().is_empty() {
        eprintln!("Label cannot be empty.");
        std::process::exit(1);
    }
    match db.add_task(&label, &category) {
        Ok(id) => {
            save_db(db, project);
            println!("Added {} ({})", label.trim(), id);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Apply one edit to a task group and save, confirming first if it discards data.
pub fn cmd_edit(db: &mut Database, project: &Project, task: &str, edit: TaskEdit, yes: bool) -> bool {
    let id = resolve(db, task);
    let applied = with_confirmation(yes, |confirmed| db.apply_edit(id, edit.clone(), confirmed));
    if applied.is_some() {
        save_db(db, project);
    }
    applied.is_some()
}

pub fn cmd_retype(db: &mut Database, project: &Project, task: String, category: String, yes: bool) {
    if cmd_edit(db, project, &task, TaskEdit::ReplaceSubTasks { category: category.clone() }, yes) {
        println!("{} is now {}.", task, category);
    }
}

pub fn cmd_step(db: &mut Database, project: &Project, action: StepAction) {
    match action {
        StepAction::Add { task, task_type, details, product } => {
            let edit = TaskEdit::AppendSubTask { task_type, details, product_name: product };
            if cmd_edit(db, project, &task, edit, false) {
                println!("Step added.");
            }
        }
        StepAction::Edit { task, step, task_type, details, product } => {
            if task_type.is_none() && details.is_none() && product.is_none() {
                eprintln!("Nothing to change. Pass --task-type, --details or --product.");
                std::process::exit(1);
            }
            let edit = TaskEdit::UpdateSubTask { step, task_type, details, product_name: product };
            if cmd_edit(db, project, &task, edit, false) {
                println!("Step updated.");
            }
        }
        StepAction::Rm { task, step, yes } => {
            if cmd_edit(db, project, &task, TaskEdit::RemoveSubTask { step }, yes) {
                println!("Step removed.");
            }
        }
        StepAction::Move { task, step, target } => {
            if cmd_edit(db, project, &task, TaskEdit::MoveSubTask { step, target }, false) {
                println!("Step moved.");
            }
        }
        StepAction::Done { task, step } => {
            if cmd_edit(db, project, &task, TaskEdit::SetCompleted { step, done: true }, false) {
                println!("Step completed.");
            }
        }
        StepAction::Undo { task, step } => {
            if cmd_edit(db, project, &task, TaskEdit::SetCompleted { step, done: false }, false) {
                println!("Step reopened.");
            }
        }
    }
}

pub fn cmd_comment(
    db: &mut Database,
    project: &Project,
    settings: &Settings,
    task: String,
    text: String,
    step: Option<String>,
    user: Option<String>,
) {
    if text.trim().is_empty() {
        eprintln!("Comment cannot be empty.");
        std::process::exit(1);
    }
    let user = user.unwrap_or_else(|| settings.operator.clone());
    if cmd_edit(db, project, &task, TaskEdit::Comment { step, user, text }, false) {
        println!("Comment added.");
    }
}

pub fn cmd_photo(db: &mut Database, project: &Project, action: PhotoAction) {
    match action {
        PhotoAction::Add { task, reference, step } => {
            if cmd_edit(db, project, &task, TaskEdit::AttachPhoto { step, reference }, false) {
                println!("Photo attached.");
            }
        }
        PhotoAction::Rm { task, position, step, yes } => {
            let Ok(index) = step_index(position) else {
                eprintln!("Photo positions start at 1.");
                std::process::exit(1);
            };
            let edit = TaskEdit::RemovePhoto { step, index };
            if cmd_edit(db, project, &task, edit, yes) {
                println!("Photo removed.");
            }
        }
    }
}

pub fn cmd_delete(db: &mut Database, project: &Project, task: String, yes: bool) {
    let id = resolve(db, &task);
    if let Some(removed) = with_confirmation(yes, |confirmed| db.remove_task(id, confirmed)) {
        save_db(db, project);
        println!("Deleted {} ({} step(s)).", removed.map_id, removed.sub_tasks.len());
    }
}

fn print_templates(templates: &[LegendTemplate]) {
    println!("{:>3}  {:<20} {:<16} {}", "#", "Category", "Keys", "Steps");
    for (i, t) in templates.iter().enumerate() {
        let keys = if t.is_auto_matchable() { t.match_keys.join(",") } else { "(manual)".to_string() };
        println!("{:>3}  {:<20} {:<16} {}", i + 1, truncate(&t.label, 20), truncate(&keys, 16), t.base_sub_tasks.len());
        for (j, s) in t.base_sub_tasks.iter().enumerate() {
            println!("       {}. {:<10} {} [{}]", j + 1, s.task_type, s.details, s.product_name);
        }
    }
}

/// Apply a template action to a category list. Returns true when the list changed.
fn edit_templates(templates: &mut Vec<LegendTemplate>, action: &TemplateAction) -> bool {
    let (edit, yes) = match action.edit() {
        Ok(Some(edit)) => edit,
        Ok(None) => {
            print_templates(templates);
            return false;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    with_confirmation(yes, |confirmed| apply_template_edit(templates, edit.clone(), confirmed)).is_some()
}

pub fn cmd_template(db: &mut Database, project: &Project, action: TemplateAction) {
    if edit_templates(&mut db.templates, &action) {
        save_db(db, project);
        println!("Categories updated for '{}'.", project.display_name);
    }
}

pub fn cmd_template_global(dir: &Path, action: TemplateAction) {
    let mut templates = match load_global_templates(dir) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read global templates: {}", e);
            std::process::exit(1);
        }
    };
    if edit_templates(&mut templates, &action) {
        if let Err(e) = save_global_templates(dir, &templates) {
            eprintln!("Failed to save global templates: {}", e);
            std::process::exit(1);
        }
        println!("Global categories updated.");
    }
}

pub fn cmd_status(db: &Database) {
    let stats = db.category_summary();
    if stats.is_empty() {
        println!("No task groups in '{}'.", db.name);
        return;
    }
    println!("{:<20} {:>6} {:>9} {:>5}", "Category", "Groups", "Steps", "%");
    let (mut done, mut total) = (0, 0);
    for s in &stats {
        println!(
            "{:<20} {:>6} {:>9} {:>4}%",
            truncate(&s.label, 20),
            s.tasks,
            format!("{}/{}", s.steps_done, s.steps_total),
            s.percent()
        );
        done += s.steps_done;
        total += s.steps_total;
    }
    let percent = if total == 0 { 0 } else { done * 100 / total };
    println!("{:<20} {:>6} {:>9} {:>4}%", "Total", db.tasks.len(), format!("{}/{}", done, total), percent);
}

pub fn cmd_backup(project: &Project) {
    match create_backup(&project.file_path) {
        Ok(backup_path) => println!("Backup created: {}", backup_path.display()),
        Err(e) => {
            eprintln!("Failed to create backup: {}", e);
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}
