use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;

/// Content entity types that may reference a media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Page,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Page => "page",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Article => "articles",
            ContentKind::Page => "pages",
        }
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    /// Accepts both the singular kind and the plural route segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article" | "articles" => Ok(ContentKind::Article),
            "page" | "pages" => Ok(ContentKind::Page),
            other => Err(AppError::Validation(format!(
                "Unknown content kind: {}",
                other
            ))),
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Pointer to one content entity, e.g. `article 10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ContentRef {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self {
            kind,
            id,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn article(id: i64) -> Self {
        Self::new(ContentKind::Article, id)
    }

    pub fn page(id: i64) -> Self {
        Self::new(ContentKind::Page, id)
    }
}

impl Display for ContentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// The columns of an article or page the media core reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub reference: ContentRef,
    pub slug: String,
    /// Articles have an author; pages do not.
    pub author_id: Option<i64>,
    pub media_id: Option<i64>,
}

/// Values for creating a content entity (used by seeding and tests; content CRUD lives elsewhere).
#[derive(Debug, Clone, PartialEq)]
pub struct NewContent {
    pub kind: ContentKind,
    pub title: String,
    pub slug: String,
    pub author_id: Option<i64>,
}
