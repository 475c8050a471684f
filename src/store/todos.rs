//! Shared to-do list: append-only records that are resolved, never deleted.
//!
//! Resolved entries stay in the snapshot with `active = false` and the name
//! of whoever answered them, so the history remains browsable with the
//! include-resolved flag.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SnapshotStore;

/// One request record. Field names match the `todo.json` wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub message: String,
    pub user: String,
    pub active: bool,
    #[serde(rename = "timeadded", with = "super::stamp")]
    pub time_added: NaiveDateTime,
    #[serde(rename = "answered")]
    pub answered_by: String,
}

pub type TodoList = Vec<Todo>;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("there is no to-do number {index}")]
    IndexOutOfRange { index: usize },
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

pub struct TodoStore {
    items: TodoList,
    snapshot: Box<dyn SnapshotStore<TodoList>>,
}

impl TodoStore {
    pub fn open(snapshot: Box<dyn SnapshotStore<TodoList>>) -> anyhow::Result<Self> {
        let items = snapshot.load()?;
        Ok(Self { items, snapshot })
    }

    /// Append an active record and persist.
    pub fn add(&mut self, message: &str, author: &str) -> Result<(), TodoError> {
        self.items.push(Todo {
            message: message.to_string(),
            user: author.to_string(),
            active: true,
            time_added: Utc::now().naive_utc(),
            answered_by: String::new(),
        });
        self.flush()
    }

    /// Mark the record at `index` resolved by `resolved_by`. Indexes are
    /// positions in the full list, matching what `render` displays.
    pub fn resolve(&mut self, index: usize, resolved_by: &str) -> Result<(), TodoError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(TodoError::IndexOutOfRange { index })?;
        item.active = false;
        item.answered_by = resolved_by.to_string();
        self.flush()
    }

    /// List entries, one line each with its list index. Resolved entries are
    /// hidden unless `include_resolved` is set, in which case they carry an
    /// "Answered by" suffix.
    pub fn render(&self, include_resolved: bool) -> String {
        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if !item.active && !include_resolved {
                continue;
            }
            out.push_str(&format!(
                "{i}: \"{}\" requested by {} at {}.",
                item.message,
                item.user,
                item.time_added.format(super::stamp::FORMAT)
            ));
            if !item.active {
                out.push_str(&format!(" Answered by {}", item.answered_by));
            }
            out.push('\n');
        }
        if out.is_empty() {
            out.push_str("Sorry, no To-Dos found!");
        }
        out
    }

    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|t| t.active).count()
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    fn flush(&self) -> Result<(), TodoError> {
        self.snapshot.save(&self.items).map_err(TodoError::Persist)
    }
}
