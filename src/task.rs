use crate::error::BoardError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used for due dates on the wire and in the CLI.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(BoardError::invalid_value(
                "priority",
                format!("expected low, medium or high, got '{other}'"),
            )),
        }
    }
}

/// A task record as it arrives from outside: every field optional, nothing checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTask {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub assignee: Option<String>,
    pub column: Option<String>,
}

/// A validated task card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTask")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub column: String,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            category: String::new(),
            due_date: None,
            assignee: None,
            column: column.into(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True when the due date lies strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today)
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, BoardError> {
    non_blank(value).ok_or_else(|| BoardError::missing_field(field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_due_date(value: &str) -> Result<NaiveDate, BoardError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|err| BoardError::invalid_value("due_date", format!("'{value}': {err}")))
}

impl TryFrom<RawTask> for Task {
    type Error = BoardError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        let id = required(raw.id, "id")?;
        let title = required(raw.title, "title")?;
        let column = required(raw.column, "column")?;
        let priority = match non_blank(raw.priority) {
            Some(p) => p.parse()?,
            None => Priority::default(),
        };
        let due_date = match non_blank(raw.due_date) {
            Some(d) => Some(parse_due_date(&d)?),
            None => None,
        };

        Ok(Task {
            id,
            title,
            description: non_blank(raw.description),
            priority,
            category: non_blank(raw.category).unwrap_or_default(),
            due_date,
            assignee: non_blank(raw.assignee),
            column,
        })
    }
}
