use serde::{Deserialize, Serialize};

/// A single todo item. The wire field names (`task`, `completada`) are fixed
/// by the backend contract and mapped via serde renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(rename = "task")]
    pub description: String,
    #[serde(rename = "completada")]
    pub completed: bool,
}

impl Task {
    pub fn new(id: u64, description: impl Into<String>) -> Self {
        Task {
            id,
            description: description.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupMode {
    None,
    AddTask,
    Help,
}
