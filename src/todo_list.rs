use chrono::Utc;

use crate::models::{Todo, TodoMode};
use crate::storage::{KeyValueStore, TodoStorage};

/// In-memory todo list mirrored to a [`TodoStorage`] after every mutation.
pub struct TodoList<S> {
    storage: TodoStorage<S>,
    todos: Vec<Todo>,
    /// `None` once ids are exhausted.
    next_id: Option<u64>,
    draft: Option<String>,
}

impl<S: KeyValueStore> TodoList<S> {
    /// Loads the persisted list and derives the id counter from it.
    pub fn load(storage: TodoStorage<S>) -> Self {
        let todos = storage.load();
        let next_id = match todos.iter().map(|t| t.id).max() {
            None => Some(1),
            Some(max) => {
                let next = max.checked_add(1);
                if next.is_none() {
                    log::error!("todo id {max} is the largest possible; new todos cannot be added");
                }
                next
            }
        };
        TodoList {
            storage,
            todos,
            next_id,
            draft: None,
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    #[cfg(test)]
    pub fn next_id(&self) -> Option<u64> {
        self.next_id
    }

    pub fn get(&self, id: u64) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.todos.iter().position(|t| t.id == id)
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = Some(text.into());
    }

    /// Commits the draft as a new todo. Blank drafts are rejected and leave
    /// the list, the counter and the draft untouched.
    pub fn add(&mut self) -> Option<u64> {
        let text = match self.draft.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => return None,
        };

        let Some(id) = self.next_id else {
            log::error!("no todo ids left, draft kept");
            return None;
        };
        self.todos.push(Todo {
            id,
            text: Some(text),
            mode: TodoMode::Display,
            created_at: Utc::now(),
        });
        self.next_id = id.checked_add(1);
        self.draft = None;
        log::debug!("added todo {id}");
        self.persist();
        Some(id)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.todos.remove(index);
        log::debug!("deleted todo {id}");
        self.persist();
        true
    }

    pub fn toggle_mode(&mut self, id: u64) -> bool {
        self.modify(id, |todo| todo.mode = todo.mode.toggled())
    }

    pub fn confirm_edit(&mut self, id: u64) -> bool {
        self.modify(id, |todo| todo.mode = TodoMode::Display)
    }

    /// Replaces the text verbatim; unlike [`TodoList::add`], empty text is accepted.
    pub fn update_text(&mut self, id: u64, text: impl Into<String>) -> bool {
        let text = text.into();
        self.modify(id, move |todo| todo.text = Some(text))
    }

    fn modify(&mut self, id: u64, f: impl FnOnce(&mut Todo)) -> bool {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        f(todo);
        log::debug!("todo {id} now {} ({:?})", todo.mode.label(), todo.text);
        self.persist();
        true
    }

    fn persist(&self) {
        // Already logged by the storage layer; the in-memory list stays authoritative.
        let _ = self.storage.save(&self.todos);
    }

    #[cfg(test)]
    pub fn storage(&self) -> &TodoStorage<S> {
        &self.storage
    }
}
