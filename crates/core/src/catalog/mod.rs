//! Story catalog
//!
//! The catalog is read-only for the whole process lifetime and can be shared
//! freely. Order is fixed: `stories()` returns the same sequence every call,
//! which is what sequential auto-play relies on.

mod builtin;

use crate::error::{AppError, Result};
use crate::types::{Story, StoryId, Validator};
use std::collections::HashSet;
use std::path::Path;

/// Category name that selects every story
pub const ALL_CATEGORIES: &str = "All";

/// Read access to an ordered set of stories
pub trait Catalog: Send + Sync {
    /// All stories in fixed catalog order
    fn stories(&self) -> &[Story];

    /// Looks up a story by id
    fn story(&self, id: &StoryId) -> Option<&Story> {
        self.stories().iter().find(|s| &s.id == id)
    }

    /// Index of a story in catalog order
    fn position(&self, id: &StoryId) -> Option<usize> {
        self.stories().iter().position(|s| &s.id == id)
    }

    /// Distinct categories in first-seen order
    fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stories()
            .iter()
            .filter(|s| seen.insert(s.category.as_str()))
            .map(|s| s.category.clone())
            .collect()
    }

    /// Stories in one category; [`ALL_CATEGORIES`] returns every story
    fn by_category(&self, category: &str) -> Vec<&Story> {
        if category == ALL_CATEGORIES {
            return self.stories().iter().collect();
        }
        self.stories()
            .iter()
            .filter(|s| s.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Case-insensitive search over title, author and category
    fn search(&self, query: &str) -> Vec<&Story> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.stories().iter().filter(|s| s.matches(query)).collect()
    }
}

/// Immutable in-memory catalog
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    stories: Vec<Story>,
}

impl StaticCatalog {
    /// Builds a catalog, rejecting duplicate ids and invalid stories
    pub fn new(stories: Vec<Story>) -> Result<Self> {
        let mut ids = HashSet::new();
        for story in &stories {
            if let Err(errors) = story.validate() {
                return Err(AppError::InvalidCatalog {
                    reason: errors.join("; "),
                });
            }
            if !ids.insert(story.id.clone()) {
                return Err(AppError::InvalidCatalog {
                    reason: format!("duplicate story id {}", story.id),
                });
            }
        }
        Ok(Self { stories })
    }

    /// The tales bundled with the application
    pub fn builtin() -> Self {
        Self {
            stories: builtin::tales(),
        }
    }

    /// Loads a catalog from a JSON array of stories
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => AppError::from(e),
        })?;

        let stories: Vec<Story> =
            serde_json::from_str(&contents).map_err(|source| AppError::CatalogParse {
                path: path.to_path_buf(),
                source,
            })?;

        log::info!("Loaded {} stories from {}", stories.len(), path.display());
        Self::new(stories)
    }

    /// Looks up a story, failing with `StoryNotFound`
    pub fn require(&self, id: &StoryId) -> Result<&Story> {
        self.story(id).ok_or_else(|| AppError::story_not_found(id))
    }

    /// Number of stories
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Returns true if the catalog has no stories
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn stories(&self) -> &[Story] {
        &self.stories
    }
}
