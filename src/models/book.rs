//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// ISBN-10 / ISBN-13, with optional hyphens
static ISBN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:97[89][- ]?)?\d{1,5}[- ]?\d{1,7}[- ]?\d{1,7}[- ]?[\dX]$").unwrap()
});

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// New available count and deficit after changing the total copy count.
    ///
    /// The available count moves by the same delta as the total so that
    /// currently-issued copies stay accounted for. A reduction larger than
    /// the available count clamps to 0 and reports the remainder as a
    /// deficit: those copies are owed back as issued items return.
    pub fn apply_total_change(available: i32, old_total: i32, new_total: i32) -> (i32, i32) {
        let delta = new_total - old_total;
        let shifted = available + delta;
        if shifted < 0 {
            (0, -shifted)
        } else {
            // Never report more available than the new total
            (shifted.min(new_total), 0)
        }
    }
}

/// Availability snapshot for a book
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookAvailability {
    pub book_id: i32,
    pub available_copies: i32,
    pub total_copies: i32,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(regex(path = *ISBN_RE, message = "Invalid ISBN format"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub publisher: Option<String>,
    #[validate(range(min = 0, max = 2100, message = "Invalid publication year"))]
    pub publish_year: Option<i32>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0, message = "Total copies must be non-negative"))]
    pub total_copies: i32,
}

/// Update book request. `total_copies` changes go through the catalog's
/// inventory adjustment so the availability invariant holds.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    #[validate(regex(path = *ISBN_RE, message = "Invalid ISBN format"))]
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 0, max = 2100, message = "Invalid publication year"))]
    pub publish_year: Option<i32>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0, message = "Total copies must be non-negative"))]
    pub total_copies: Option<i32>,
    pub is_active: Option<bool>,
}

/// Book search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    /// Include deactivated books (librarian views)
    pub include_inactive: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_total_grows_available() {
        assert_eq!(Book::apply_total_change(2, 5, 8), (5, 0));
    }

    #[test]
    fn shrinking_total_shrinks_available() {
        assert_eq!(Book::apply_total_change(4, 5, 3), (2, 0));
    }

    #[test]
    fn reduction_below_available_clamps_and_records_deficit() {
        // 1 available of 5, shrink to 2: delta -3 would leave -2
        assert_eq!(Book::apply_total_change(1, 5, 2), (0, 2));
    }

    #[test]
    fn available_never_exceeds_new_total() {
        assert_eq!(Book::apply_total_change(5, 5, 3), (3, 0));
    }

    #[test]
    fn shrink_to_zero() {
        assert_eq!(Book::apply_total_change(3, 5, 0), (0, 2));
        assert_eq!(Book::apply_total_change(5, 5, 0), (0, 0));
    }

    #[test]
    fn isbn_regex_accepts_common_forms() {
        assert!(ISBN_RE.is_match("978-0-00-000000-0"));
        assert!(ISBN_RE.is_match("9780306406157"));
        assert!(ISBN_RE.is_match("0-306-40615-2"));
        assert!(ISBN_RE.is_match("030640615X"));
        assert!(!ISBN_RE.is_match("not-an-isbn"));
    }
}
