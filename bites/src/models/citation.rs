use serde::{Deserialize, Serialize};

/// A single provenance entry attached to a backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Citation {
    /// A web page consulted by the backend.
    Web { uri: String, title: String },
    /// A map entry, optionally with review excerpts.
    #[serde(rename_all = "camelCase")]
    Maps {
        uri: String,
        title: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        review_snippets: Vec<String>,
    },
}

impl Citation {
    pub fn uri(&self) -> &str {
        match self {
            Self::Web { uri, .. } | Self::Maps { uri, .. } => uri,
        }
    }

    /// Title to show on the source chip; blank titles get a generic label.
    pub fn label(&self) -> &str {
        match self {
            Self::Web { title, .. } if !title.trim().is_empty() => title,
            Self::Web { .. } => "Web Source",
            Self::Maps { title, .. } if !title.trim().is_empty() => title,
            Self::Maps { .. } => "Map Location",
        }
    }
}

/// Ordered provenance list, in the order the backend supplied it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CitationMetadata {
    pub entries: Vec<Citation>,
}

impl CitationMetadata {
    pub fn new(entries: Vec<Citation>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
