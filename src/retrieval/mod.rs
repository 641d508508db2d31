//! Candidate article selection.
//!
//! A [`SelectionCriteria`] describes how to obtain candidates; the
//! [`Retriever`] resolves it against the article store, computing similarity
//! ranking in the application rather than in SQL.

mod retriever;

pub use retriever::Retriever;

use crate::error::{FortellError, Result};
use serde::{Deserialize, Serialize};

/// How to obtain candidate articles. Exactly one variant is active per
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SelectionCriteria {
    /// Embed free-text and rank by cosine distance.
    ByQueryText {
        text: String,
        limit: usize,
        categories: Option<Vec<i64>>,
        similarity_floor: Option<f32>,
    },
    /// Rank by cosine distance to a supplied vector (no embedding call).
    ByUserPreference {
        vector: Vec<f32>,
        limit: usize,
        similarity_floor: Option<f32>,
    },
    /// Fetch by primary key, preserving input order; missing ids are
    /// silently omitted.
    ByIds(Vec<i64>),
    /// All articles in the category set, newest first, capped at limit.
    ByCategory { categories: Vec<i64>, limit: usize },
}

impl SelectionCriteria {
    /// Validate the criteria before any external call is made.
    pub fn validate(&self) -> Result<()> {
        match self {
            // Empty query text is not a criteria shape problem; it surfaces
            // from the embedding client, which cannot embed it.
            SelectionCriteria::ByQueryText {
                limit,
                similarity_floor,
                ..
            } => {
                Self::check_limit(*limit)?;
                Self::check_floor(*similarity_floor)
            }
            SelectionCriteria::ByUserPreference {
                vector,
                limit,
                similarity_floor,
            } => {
                if vector.is_empty() {
                    return Err(FortellError::InvalidCriteria(
                        "Preference vector must not be empty".to_string(),
                    ));
                }
                Self::check_limit(*limit)?;
                Self::check_floor(*similarity_floor)
            }
            SelectionCriteria::ByIds(ids) => {
                if ids.is_empty() {
                    return Err(FortellError::InvalidCriteria(
                        "Article id list must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            SelectionCriteria::ByCategory { categories, limit } => {
                if categories.is_empty() {
                    return Err(FortellError::InvalidCriteria(
                        "Category list must not be empty".to_string(),
                    ));
                }
                Self::check_limit(*limit)
            }
        }
    }

    fn check_limit(limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(FortellError::InvalidCriteria(
                "Limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn check_floor(floor: Option<f32>) -> Result<()> {
        if let Some(f) = floor {
            if !(0.0..=1.0).contains(&f) {
                return Err(FortellError::InvalidCriteria(format!(
                    "Similarity floor {} is outside [0, 1]",
                    f
                )));
            }
        }
        Ok(())
    }
}
