use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::new_id;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub trip_id: String,
    pub title: String,
    /// Member id to completion flag. Missing members count as not done.
    pub completed_by: BTreeMap<String, bool>,
    pub created_by: String,
}

impl TodoItem {
    pub fn new(trip_id: &str, created_by: &str, title: &str) -> Result<Self, AppError> {
        Ok(Self {
            id: new_id("todo"),
            trip_id: trip_id.to_string(),
            title: validate_title(title)?,
            completed_by: BTreeMap::new(),
            created_by: created_by.to_string(),
        })
    }

    pub fn rename(&mut self, title: &str) -> Result<(), AppError> {
        self.title = validate_title(title)?;
        Ok(())
    }

    pub fn is_completed_by(&self, user_id: &str) -> bool {
        self.completed_by.get(user_id).copied().unwrap_or(false)
    }

    /// Flips the member's flag and returns the new value.
    pub fn toggle(&mut self, user_id: &str) -> bool {
        let done = !self.is_completed_by(user_id);
        self.completed_by.insert(user_id.to_string(), done);
        done
    }

    /// True iff every current member has ticked the item.
    pub fn is_fully_completed(&self, member_ids: &[String]) -> bool {
        member_ids.iter().all(|id| self.is_completed_by(id))
    }

    pub fn pending_members(&self, member_ids: &[String]) -> Vec<String> {
        member_ids
            .iter()
            .filter(|id| !self.is_completed_by(id))
            .cloned()
            .collect()
    }

    pub fn view(self, member_ids: &[String]) -> TodoView {
        TodoView {
            fully_completed: self.is_fully_completed(member_ids),
            pending_members: self.pending_members(member_ids),
            todo: self,
        }
    }
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("To-do title must not be empty"));
    }
    Ok(title.to_string())
}

/// A to-do together with its completion state for the trip's current members.
#[derive(Debug, Clone, Serialize)]
pub struct TodoView {
    #[serde(flatten)]
    pub todo: TodoItem,
    pub fully_completed: bool,
    pub pending_members: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn complete_only_when_every_current_member_ticked() {
        let mut todo = TodoItem::new("trip_1", "alice", "Book ferry").unwrap();
        let crew = members(&["alice", "bob"]);
        assert!(!todo.is_fully_completed(&crew));

        todo.toggle("alice");
        assert!(!todo.is_fully_completed(&crew));
        assert_eq!(todo.pending_members(&crew), members(&["bob"]));

        todo.toggle("bob");
        assert!(todo.is_fully_completed(&crew));
    }

    #[test]
    fn former_members_do_not_count_but_new_members_do() {
        let mut todo = TodoItem::new("trip_1", "alice", "Pack").unwrap();
        todo.toggle("alice");
        todo.toggle("carol");
        assert!(todo.is_fully_completed(&members(&["alice"])));
        assert!(!todo.is_fully_completed(&members(&["alice", "dave"])));
    }

    #[test]
    fn explicit_false_is_not_complete() {
        let mut todo = TodoItem::new("trip_1", "alice", "Pack").unwrap();
        assert!(todo.toggle("alice"));
        assert!(!todo.toggle("alice"));
        assert_eq!(todo.completed_by.get("alice"), Some(&false));
        assert!(!todo.is_fully_completed(&members(&["alice"])));
    }

    #[test]
    fn no_members_is_vacuously_complete() {
        let todo = TodoItem::new("trip_1", "alice", "Pack").unwrap();
        assert!(todo.is_fully_completed(&[]));
    }

    #[test]
    fn blank_titles_are_rejected() {
        assert!(TodoItem::new("trip_1", "alice", "  ").is_err());
    }
}
