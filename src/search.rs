//! Case-insensitive search across every project in the data directory.

use std::path::Path;

use uuid::Uuid;

use crate::db::Database;
use crate::error::StoreError;
use crate::project::discover_projects;

/// What a search hit points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Project,
    Task,
    Step,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: HitKind,
    /// Display name of the project the hit belongs to.
    pub project: String,
    /// Owning task group, for task and step hits.
    pub task: Option<Uuid>,
    pub title: String,
    pub subtitle: String,
}

/// Hits within one project, in document order: the project itself, then each
/// task group followed by its matching steps.
pub fn search_database(db: &Database, query: &str) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    let mut hits = Vec::new();
    if query.is_empty() {
        return hits;
    }
    let found = |text: &str| text.to_lowercase().contains(&query);

    if found(&db.name) || found(&db.description) {
        hits.push(SearchHit {
            kind: HitKind::Project,
            project: db.name.clone(),
            task: None,
            title: db.name.clone(),
            subtitle: "Site project".into(),
        });
    }
    for t in &db.tasks {
        if found(&t.map_id) {
            hits.push(SearchHit {
                kind: HitKind::Task,
                project: db.name.clone(),
                task: Some(t.id),
                title: format!("Task: {}", t.map_id),
                subtitle: format!("In: {}", db.name),
            });
        }
        for s in t.sub_tasks.iter().filter(|s| found(&s.details) || found(&s.product_name)) {
            hits.push(SearchHit {
                kind: HitKind::Step,
                project: db.name.clone(),
                task: Some(t.id),
                title: s.details.clone(),
                subtitle: format!("Step {} in {} ({})", s.sub_task_id, t.map_id, db.name),
            });
        }
    }
    hits
}

/// Search every project in `dir`. Projects whose file cannot be read are skipped.
pub fn search_projects(dir: &Path, query: &str) -> Result<Vec<SearchHit>, StoreError> {
    let mut hits = Vec::new();
    for project in discover_projects(dir)? {
        match project.load_database() {
            Ok(db) => hits.extend(search_database(&db, query)),
            Err(e) => log::warn!("Skipping project '{}' in search: {}", project.display_name, e),
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TaskEdit;
    use crate::legend::default_templates;
    use crate::project::create_project;

    #[test]
    fn blank_query_finds_nothing() {
        let mut db = Database::new("Lake House", "", default_templates());
        db.add_task("D101", "Data Jacks").unwrap();
        assert!(search_database(&db, "  ").is_empty());
    }

    #[test]
    fn matches_labels_steps_and_products() {
        let mut db = Database::new("Lake House", "Dock and boathouse", default_templates());
        let tv = db.add_task("TV1", "TV").unwrap();
        db.add_task("D101", "Data Jacks").unwrap();

        let hits = search_database(&db, "sanus");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, HitKind::Step);
        assert_eq!(hits[0].task, Some(tv));
        assert_eq!(hits[0].title, "Mount TV and conceal wires");

        let hits = search_database(&db, "d10");
        let kinds: Vec<_> = hits.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, [HitKind::Task]);

        let hits = search_database(&db, "BOATHOUSE");
        assert_eq!(hits[0].kind, HitKind::Project);
    }

    #[test]
    fn edited_steps_are_found_by_their_new_text() {
        let mut db = Database::new("Site", "", default_templates());
        let id = db.add_task("D1", "Data Jacks").unwrap();
        let edit = TaskEdit::UpdateSubTask {
            step: "1".into(),
            task_type: None,
            details: Some("Pull second drop to garage".into()),
            product_name: None,
        };
        db.apply_edit(id, edit, false).unwrap();
        assert_eq!(search_database(&db, "garage").len(), 1);
    }

    #[test]
    fn searches_every_project_in_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Lake House", "Office"] {
            let project = create_project(name, "", default_templates(), dir.path()).unwrap();
            let mut db = project.load_database().unwrap();
            db.add_task("AP1", "In-Wall WAP").unwrap();
            db.save(&project.file_path).unwrap();
        }
        std::fs::write(dir.path().join("broken_project.json"), "{").unwrap();

        let hits = search_projects(dir.path(), "ap1").unwrap();
        let projects: Vec<_> = hits.iter().map(|h| h.project.as_str()).collect();
        assert_eq!(projects, ["Lake House", "Office"]);
    }
}
