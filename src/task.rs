//! Task group data structures.
//!
//! A `Task` is the per-device container created for one floorplan label; its
//! `SubTask`s are the ordered checklist steps technicians complete, photograph
//! and annotate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note left on a task group or one of its steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user: String,
    pub text: String,
    pub timestamp_utc: i64,
}

impl Comment {
    pub fn new(user: &str, text: &str, timestamp_utc: i64) -> Self {
        Comment {
            id: Uuid::new_v4(),
            user: user.to_string(),
            text: text.to_string(),
            timestamp_utc,
        }
    }
}

/// A single checklist step within a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: Uuid,
    /// Display identifier, e.g. `D101-02`.
    pub sub_task_id: String,
    pub category: String,
    pub task_type: String,
    pub details: String,
    pub product_name: String,
    pub is_completed: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Photo references (paths or URIs).
    #[serde(default)]
    pub photos: Vec<String>,
}

/// The per-device container holding an ordered checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    /// The floorplan label this group was created for.
    pub map_id: String,
    pub name: String,
    /// Label of the category the task belongs to.
    #[serde(rename = "type")]
    pub kind: String,
    pub sub_tasks: Vec<SubTask>,
    pub created_at_utc: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Task {
    /// Number of completed steps and total steps.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.sub_tasks.iter().filter(|s| s.is_completed).count();
        (done, self.sub_tasks.len())
    }

    pub fn is_complete(&self) -> bool {
        self.sub_tasks.iter().all(|s| s.is_completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(done: bool) -> SubTask {
        SubTask {
            id: Uuid::new_v4(),
            sub_task_id: "D1-01".into(),
            category: "Data Jacks".into(),
            task_type: "Trim".into(),
            details: String::new(),
            product_name: "N/A".into(),
            is_completed: done,
            comments: Vec::new(),
            photos: Vec::new(),
        }
    }

    #[test]
    fn progress_counts_completed_steps() {
        let task = Task {
            id: Uuid::new_v4(),
            map_id: "D1".into(),
            name: "D1".into(),
            kind: "Data Jacks".into(),
            sub_tasks: vec![step(true), step(false), step(true)],
            created_at_utc: 0,
            comments: Vec::new(),
            photos: Vec::new(),
        };
        assert_eq!(task.progress(), (2, 3));
        assert!(!task.is_complete());
    }

    #[test]
    fn serializes_with_field_names_of_the_stored_model() {
        let json = serde_json::to_value(step(false)).unwrap();
        assert!(json.get("subTaskId").is_some());
        assert!(json.get("isCompleted").is_some());
        assert!(json.get("productName").is_some());
    }

    #[test]
    fn missing_comments_and_photos_default_to_empty() {
        let raw = r#"{"id":"6f1c1c6e-2f7e-4b86-9d0e-4a8f0b1de001","subTaskId":"AP1-01","category":"In-Wall WAP",
            "taskType":"Install","details":"","productName":"N/A","isCompleted":true}"#;
        let st: SubTask = serde_json::from_str(raw).unwrap();
        assert!(st.photos.is_empty());
        assert!(st.comments.is_empty());
    }
}
