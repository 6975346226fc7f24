//! Announcement models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Announcement category, in the order the submission form lists them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Notice,
    Event,
    MealMenu,
    ScheduleChange,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Notice,
        Category::Event,
        Category::MealMenu,
        Category::ScheduleChange,
    ];

    /// Korean label shown to students and staff.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Notice => "공지사항",
            Category::Event => "행사",
            Category::MealMenu => "급식메뉴",
            Category::ScheduleChange => "일정변경",
        }
    }

    /// Short ASCII keyword accepted on the command line.
    pub fn keyword(&self) -> &'static str {
        match self {
            Category::Notice => "notice",
            Category::Event => "event",
            Category::MealMenu => "meal",
            Category::ScheduleChange => "schedule",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.keyword().eq_ignore_ascii_case(trimmed) || c.label() == trimmed)
            .ok_or_else(|| {
                let choices: Vec<&str> = Category::ALL.iter().map(|c| c.keyword()).collect();
                format!("unknown category '{}' (expected one of: {})", trimmed, choices.join(", "))
            })
    }
}

/// What the submission form collects before the board assigns id and time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub category: Category,
}

impl NewsDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub timestamp: DateTime<Local>,
}

impl NewsItem {
    pub fn from_draft(draft: NewsDraft, timestamp: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            timestamp,
        }
    }

    /// Timestamp formatted for listings, e.g. "2024-03-05 08:30".
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}
