//! Story domain model

use crate::types::Validator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier of a story (for example `tale-3`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    /// Creates a story id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A short story from the catalog
///
/// Stories are immutable once the catalog is built. Narration borrows a clone
/// for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Display label such as `"8 min"`
    #[serde(alias = "duration")]
    pub duration_label: String,
    pub summary: String,
    pub content: String,
}

impl Story {
    /// Creates a story with an empty summary and duration label
    pub fn new(
        id: impl Into<StoryId>,
        title: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            category: category.into(),
            duration_label: String::new(),
            summary: String::new(),
            content: content.into(),
        }
    }

    /// Sets the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the duration label
    pub fn with_duration_label(mut self, label: impl Into<String>) -> Self {
        self.duration_label = label.into();
        self
    }

    /// Case-insensitive match against title, author and category
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}

impl Validator for Story {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Story id must not be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push(format!("Story {} has an empty title", self.id));
        }

        if self.content.trim().is_empty() {
            errors.push(format!("Story {} has no content", self.id));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
