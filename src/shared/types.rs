//! Common types used across the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination list for a token update.
///
/// Derived from a message on every pass through the classifier, never stored on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    NewlyCreated,
    AboutToGraduate,
    Graduated,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::NewlyCreated,
        Category::AboutToGraduate,
        Category::Graduated,
    ];

    /// Stable slot used by per-category arrays
    pub fn index(self) -> usize {
        match self {
            Category::NewlyCreated => 0,
            Category::AboutToGraduate => 1,
            Category::Graduated => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::NewlyCreated => "newlyCreated",
            Category::AboutToGraduate => "aboutToGraduate",
            Category::Graduated => "graduated",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` tag of a token update, resolved once at the parse boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    New,
    Update(String),
}

impl MessageKind {
    pub fn is_new(&self) -> bool {
        matches!(self, MessageKind::New)
    }
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Update("update".to_string())
    }
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        if tag == "new" {
            MessageKind::New
        } else {
            MessageKind::Update(tag)
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::New => "new".to_string(),
            MessageKind::Update(tag) => tag,
        }
    }
}

/// One token's state at a point in time.
///
/// `mint` identifies the logical token across its whole lifetime; several
/// messages with the same mint are updates to one entity. Fields the pipeline
/// does not look at are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUpdateMessage {
    pub mint: String,
    #[serde(default)]
    pub dex: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenUpdateMessage {
    pub fn new(mint: impl Into<String>, dex: impl Into<String>, progress: f64, kind: MessageKind) -> Self {
        Self {
            mint: mint.into(),
            dex: dex.into(),
            progress,
            kind,
            image: None,
            name: None,
            symbol: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Image presence means the token's metadata has fully arrived
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|image| !image.is_empty())
    }
}
