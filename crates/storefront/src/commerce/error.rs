//! Commerce provider errors.

use thiserror::Error;

use crate::swr::OriginError;

/// Errors that can occur when talking to a commerce backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend could not be reached.
    #[error("origin error: {0}")]
    Origin(#[from] OriginError),

    /// The backend answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// A field the caller depends on was absent.
    #[error("missing data: {0}")]
    MissingData(&'static str),

    /// A price could not be parsed.
    #[error("invalid price: {0}")]
    Price(#[from] storefront_cache_core::PriceError),
}

impl ProviderError {
    /// Short label for the failure class, used as a Sentry tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Origin(_) => "origin",
            Self::Status(_) => "status",
            Self::Parse(_) => "parse",
            Self::GraphQL(_) => "graphql",
            Self::MissingData(_) => "missing_data",
            Self::Price(_) => "price",
        }
    }
}

/// A GraphQL error returned by the backend.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GraphQLError {
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Source locations in the query.
    #[serde(default)]
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
