use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// chrono only localizes with `unstable-locales`; the short date stays fixed.
pub const SHORT_DATE_FORMAT: &str = "%m/%d/%y";

/// A single to-do entry. Field names on disk match the layout the mobile app
/// wrote, so existing `@todo_list` values load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    #[serde(rename = "todo")]
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub mode: TodoMode,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Todo {
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Text on a single line, newlines escaped as `\n`.
    pub fn one_line_text(&self) -> String {
        self.text_or_empty().replace('\n', "\\n")
    }

    /// Creation date as `mm/dd/yy` in the local timezone.
    pub fn created_date(&self) -> String {
        self.created_at.with_timezone(&Local).format(SHORT_DATE_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoMode {
    #[serde(rename = "text")]
    Display,
    #[serde(rename = "input")]
    Edit,
}

impl TodoMode {
    pub fn toggled(self) -> Self {
        match self {
            TodoMode::Display => TodoMode::Edit,
            TodoMode::Edit => TodoMode::Display,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TodoMode::Display => "display",
            TodoMode::Edit => "edit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    List,
    Field,
}

/// Per-row action glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Delete,
    ToggleEdit,
    Confirm,
}

impl RowAction {
    pub const ALL: [RowAction; 3] = [RowAction::Delete, RowAction::ToggleEdit, RowAction::Confirm];

    pub fn glyph(self) -> &'static str {
        match self {
            RowAction::Delete => "✗",
            RowAction::ToggleEdit => "✎",
            RowAction::Confirm => "✓",
        }
    }

    pub fn enabled(self, mode: TodoMode) -> bool {
        match self {
            RowAction::Delete => true,
            RowAction::ToggleEdit => mode == TodoMode::Display,
            RowAction::Confirm => mode == TodoMode::Edit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn serializes_with_original_field_names() {
        let todo = Todo {
            id: 3,
            text: Some("Buy milk".to_string()),
            mode: TodoMode::Edit,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["todo"], "Buy milk");
        assert_eq!(json["type"], "input");
        assert_eq!(json["createdAt"], "2025-03-01T09:30:00Z");
    }

    #[test]
    fn reads_millisecond_timestamps_and_null_text() {
        let json = r#"{"id":1,"todo":null,"type":"text","createdAt":"2025-03-01T09:30:00.000Z"}"#;
        let todo: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(todo.text, None);
        assert_eq!(todo.mode, TodoMode::Display);
        assert_eq!(todo.created_at, Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn short_date_is_month_day_year_in_local_time() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let todo = Todo {
            id: 1,
            text: None,
            mode: TodoMode::Display,
            created_at,
        };
        let local = created_at.with_timezone(&Local);
        assert_eq!(
            todo.created_date(),
            format!("{:02}/{:02}/{:02}", local.month(), local.day(), local.year() % 100)
        );
    }

    #[test]
    fn one_line_text_escapes_newlines() {
        let mut todo = Todo {
            id: 1,
            text: Some("Buy\noat milk".to_string()),
            mode: TodoMode::Edit,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        };
        assert_eq!(todo.one_line_text(), "Buy\\noat milk");
        todo.text = None;
        assert_eq!(todo.one_line_text(), "");
    }

    #[test]
    fn toggle_is_involutive() {
        assert_eq!(TodoMode::Display.toggled().toggled(), TodoMode::Display);
        assert_eq!(TodoMode::Edit.toggled(), TodoMode::Display);
    }

    #[test]
    fn row_actions_follow_mode() {
        assert!(RowAction::Delete.enabled(TodoMode::Edit));
        assert!(RowAction::ToggleEdit.enabled(TodoMode::Display));
        assert!(!RowAction::ToggleEdit.enabled(TodoMode::Edit));
        assert!(RowAction::Confirm.enabled(TodoMode::Edit));
        assert!(!RowAction::Confirm.enabled(TodoMode::Display));
    }
}
