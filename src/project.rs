//! Project discovery, naming and per-project files.
//!
//! Each project lives in the data directory as `<name>_project.json`, next to
//! its uploaded floorplan `<name>_map.pdf`. While an import runs the project
//! also has a `<name>.import.lock` file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::db::Database;
use crate::error::StoreError;
use crate::legend::LegendTemplate;

const PROJECT_SUFFIX: &str = "_project";

/// A project with its name and file locations.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Project {
    /// Locate the project with the given display name (the file may not exist yet).
    pub fn new(display_name: &str, dir: &Path) -> Self {
        let name = sanitize_project_name(display_name);
        let file_path = dir.join(format!("{}{}.json", name, PROJECT_SUFFIX));

        Project {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Recognize a project from its database file path.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        if file_path.extension()?.to_str()? != "json" {
            return None;
        }
        let file_name = file_path.file_stem()?.to_str()?;
        let name = file_name.strip_suffix(PROJECT_SUFFIX)?;
        if name.is_empty() {
            return None;
        }
        let display_name = name.replace('_', " ");

        Some(Project {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    fn dir(&self) -> &Path {
        self.file_path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    pub fn load_database(&self) -> Result<Database, StoreError> {
        if !self.exists() {
            return Err(StoreError::ProjectNotFound(self.display_name.clone()));
        }
        Database::load(&self.file_path)
    }

    pub fn map_path(&self) -> PathBuf {
        self.dir().join(format!("{}_map.pdf", self.name))
    }

    /// Store the raw uploaded map document, replacing any earlier one.
    pub fn put_map(&self, bytes: &[u8]) -> Result<(), StoreError> {
        fs::write(self.map_path(), bytes)?;
        Ok(())
    }

    /// The stored map document, if one was uploaded.
    pub fn get_map(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.map_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    /// Remove the project file and its stored map. Refused while an import holds the lock.
    pub fn delete(&self) -> Result<(), StoreError> {
        if !self.exists() {
            return Err(StoreError::ProjectNotFound(self.display_name.clone()));
        }
        let _lock = self.lock_import()?;
        fs::remove_file(&self.file_path)?;
        let map = self.map_path();
        if map.exists() {
            fs::remove_file(map)?;
        }
        log::info!("Deleted project '{}'", self.display_name);
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        self.dir().join(format!("{}.import.lock", self.name))
    }

    /// Take the per-project import lock. Fails while another import holds it.
    pub fn lock_import(&self) -> Result<ImportLock, StoreError> {
        let path = self.lock_path();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(ImportLock { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(StoreError::ImportInProgress {
                project: self.display_name.clone(),
                lock: path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Held for the duration of an import; removes the lock file when dropped.
#[derive(Debug)]
pub struct ImportLock {
    path: PathBuf,
}

impl Drop for ImportLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Could not remove import lock {}: {}", self.path.display(), e);
        }
    }
}

/// Convert a display name to a safe project name for file naming.
/// Converts to lowercase and replaces spaces with underscores.
pub fn sanitize_project_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all existing projects in the data directory, sorted by display name.
pub fn discover_projects(dir: &Path) -> Result<Vec<Project>, std::io::Error> {
    let mut projects = Vec::new();

    if !dir.exists() {
        return Ok(projects);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            if let Some(project) = Project::from_file(path) {
                projects.push(project);
            }
        }
    }

    projects.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(projects)
}

/// Create a new project seeded with the given category list.
pub fn create_project(
    display_name: &str,
    description: &str,
    templates: Vec<LegendTemplate>,
    dir: &Path,
) -> Result<Project, StoreError> {
    if sanitize_project_name(display_name).is_empty() {
        return Err(StoreError::EmptyName);
    }

    let project = Project::new(display_name.trim(), dir);
    if project.exists() {
        return Err(StoreError::ProjectExists(display_name.to_string()));
    }

    Database::new(display_name.trim(), description, templates).save(&project.file_path)?;
    log::info!("Created project '{}' at {}", display_name, project.file_path.display());
    Ok(project)
}

/// Find the most recently modified project in the data directory.
pub fn get_most_recent_project(dir: &Path) -> Result<Option<Project>, std::io::Error> {
    let mut most_recent: Option<(Project, std::time::SystemTime)> = None;

    for project in discover_projects(dir)? {
        let Ok(modified) = fs::metadata(&project.file_path).and_then(|m| m.modified()) else {
            continue;
        };
        match &most_recent {
            Some((_, current)) if *current >= modified => {}
            _ => most_recent = Some((project, modified)),
        }
    }

    Ok(most_recent.map(|(project, _)| project))
}

/// Copy a project file into `<dir>/backup/` with a timestamp prefix.
pub fn create_backup(db_path: &Path) -> Result<PathBuf, std::io::Error> {
    if !db_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Project file does not exist",
        ));
    }

    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let db_filename = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("project.json");

    let backup_path = backup_dir.join(format!("{}_{}", timestamp, db_filename));
    fs::copy(db_path, &backup_path)?;
    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::default_templates;

    #[test]
    fn test_sanitize_project_name() {
        assert_eq!(sanitize_project_name("My Project"), "my_project");
        assert_eq!(sanitize_project_name("Test-Project_123"), "test_project_123");
        assert_eq!(sanitize_project_name("Special!@#$%Characters"), "special_characters");
        assert_eq!(sanitize_project_name("  Multiple   Spaces  "), "multiple_spaces");
        assert_eq!(sanitize_project_name(""), "");
    }

    #[test]
    fn create_discover_and_reject_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        create_project("Lake House", "", default_templates(), dir.path()).unwrap();
        create_project("Office", "Suite 200", default_templates(), dir.path()).unwrap();
        fs::write(dir.path().join("settings.json"), "{}").unwrap();

        let names: Vec<_> = discover_projects(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, ["lake house", "office"]);

        assert!(matches!(
            create_project("lake house", "", Vec::new(), dir.path()),
            Err(StoreError::ProjectExists(_))
        ));
        assert!(matches!(
            create_project(" !! ", "", Vec::new(), dir.path()),
            Err(StoreError::EmptyName)
        ));
    }

    #[test]
    fn map_blob_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let project = create_project("Site", "", default_templates(), dir.path()).unwrap();
        assert_eq!(project.get_map().unwrap(), None);
        project.put_map(b"%PDF-1.4 fake").unwrap();
        assert_eq!(project.get_map().unwrap().as_deref(), Some(&b"%PDF-1.4 fake"[..]));
    }

    #[test]
    fn second_import_lock_is_refused_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new("Site", dir.path());
        let lock = project.lock_import().unwrap();
        assert!(matches!(project.lock_import(), Err(StoreError::ImportInProgress { .. })));
        drop(lock);
        assert!(project.lock_import().is_ok());
    }

    #[test]
    fn backup_copies_the_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = create_project("Site", "", default_templates(), dir.path()).unwrap();
        let backup = create_backup(&project.file_path).unwrap();
        assert!(backup.starts_with(dir.path().join("backup")));
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&project.file_path).unwrap());
    }

    #[test]
    fn deleting_removes_project_and_map() {
        let dir = tempfile::tempdir().unwrap();
        let project = create_project("Lake House", "", default_templates(), dir.path()).unwrap();
        create_project("Office", "", default_templates(), dir.path()).unwrap();
        project.put_map(b"%PDF-1.4 fake").unwrap();

        project.delete().unwrap();
        assert!(!project.exists());
        assert!(!project.map_path().exists());
        let names: Vec<_> = discover_projects(dir.path()).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["office"]);
        assert!(matches!(project.delete(), Err(StoreError::ProjectNotFound(_))));
    }

    #[test]
    fn deleting_waits_for_a_running_import() {
        let dir = tempfile::tempdir().unwrap();
        let project = create_project("Site", "", default_templates(), dir.path()).unwrap();
        let lock = project.lock_import().unwrap();
        assert!(matches!(project.delete(), Err(StoreError::ImportInProgress { .. })));
        assert!(project.exists());
        drop(lock);
        project.delete().unwrap();
    }

    #[test]
    fn loading_a_missing_project_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new("Ghost", dir.path());
        assert!(matches!(project.load_database(), Err(StoreError::ProjectNotFound(_))));
    }
}
