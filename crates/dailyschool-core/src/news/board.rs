use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

use crate::models::{Category, NewsDraft, NewsItem};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Content is required")]
    EmptyContent,
}

/// Announcements of one category, in posting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub category: Category,
    pub items: Vec<&'a NewsItem>,
}

/// Group items by category. Groups appear in the order their category was
/// first seen.
pub fn group_by_category<'a, I>(items: I) -> Vec<CategoryGroup<'a>>
where
    I: IntoIterator<Item = &'a NewsItem>,
{
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g.category == item.category) {
            Some(group) => group.items.push(item),
            None => groups.push(CategoryGroup {
                category: item.category,
                items: vec![item],
            }),
        }
    }
    groups
}

#[derive(Debug, Default)]
pub struct NewsBoard {
    items: Vec<NewsItem>,
}

impl NewsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a draft now.
    pub fn add(&mut self, draft: NewsDraft) -> Result<&NewsItem, BoardError> {
        self.add_at(draft, Local::now())
    }

    /// Post a draft with an explicit timestamp.
    pub fn add_at(&mut self, draft: NewsDraft, timestamp: DateTime<Local>) -> Result<&NewsItem, BoardError> {
        Self::validate(&draft)?;
        let item = NewsItem::from_draft(draft, timestamp);
        debug!(id = %item.id, category = item.category.keyword(), "Announcement added");
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    /// Reject drafts missing a required field.
    pub fn validate(draft: &NewsDraft) -> Result<(), BoardError> {
        if draft.title.trim().is_empty() {
            return Err(BoardError::EmptyTitle);
        }
        if draft.content.trim().is_empty() {
            return Err(BoardError::EmptyContent);
        }
        Ok(())
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn grouped(&self) -> Vec<CategoryGroup<'_>> {
        group_by_category(&self.items)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
