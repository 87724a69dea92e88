use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Kind of learning material a user is tracking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Book,
    Course,
    Article,
    Video,
    Other,
}

impl ItemType {
    /// Maps a stored value onto a known kind; anything unrecognised is `Other`
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "book" => ItemType::Book,
            "course" => ItemType::Course,
            "article" => ItemType::Article,
            "video" => ItemType::Video,
            _ => ItemType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Book => "book",
            ItemType::Course => "course",
            ItemType::Article => "article",
            ItemType::Video => "video",
            ItemType::Other => "other",
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a user on a learning item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    CurrentlyLearning,
    Completed,
}

impl ItemStatus {
    /// Only an explicit `completed` counts as finished
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "completed" => ItemStatus::Completed,
            _ => ItemStatus::CurrentlyLearning,
        }
    }

    /// Human-readable phrase used in material summaries
    pub fn phrase(&self) -> &'static str {
        match self {
            ItemStatus::CurrentlyLearning => "currently learning",
            ItemStatus::Completed => "completed",
        }
    }
}

/// A book, course, article or video a user is studying or has finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningItem {
    pub title: String,
    pub author: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub status: ItemStatus,
}

impl LearningItem {
    /// Renders `- <title>[ by <author>] (<type>, <status>)`
    pub fn summary_line(&self) -> String {
        let author = match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => format!(" by {}", author),
            _ => String::new(),
        };

        format!(
            "- {}{} ({}, {})",
            self.title,
            author,
            self.item_type,
            self.status.phrase()
        )
    }
}

/// Raw `learning_items` row as read from Postgres
#[derive(Debug, sqlx::FromRow)]
pub struct LearningItemRow {
    pub title: String,
    pub author: Option<String>,
    pub item_type: Option<String>,
    pub status: Option<String>,
}

impl From<LearningItemRow> for LearningItem {
    fn from(row: LearningItemRow) -> Self {
        Self {
            title: row.title,
            author: row.author,
            item_type: row
                .item_type
                .as_deref()
                .map(ItemType::from_db)
                .unwrap_or(ItemType::Other),
            status: row
                .status
                .as_deref()
                .map(ItemStatus::from_db)
                .unwrap_or(ItemStatus::CurrentlyLearning),
        }
    }
}
