//! Pagination types for list endpoints.
//!
//! The backend uses page-number pagination and wraps list responses in an
//! envelope:
//!
//! ```json
//! {
//!   "count": 42,
//!   "next": "https://api.example.com/api/tasks/?page=3",
//!   "previous": "https://api.example.com/api/tasks/?page=1",
//!   "results": [...]
//! }
//! ```
//!
//! Some endpoints return a bare array instead; [`Paginated`] accepts both so
//! callers never branch on the response shape.
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_core::pagination::{PageQuery, Paginated};
//!
//! let query = PageQuery { page: Some(2), page_size: Some(25) };
//! let page: Paginated<Task> = client.get_query("/tasks/", &query).await?;
//!
//! if page.has_more() {
//!     let next = query.next();
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A page of results from a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    /// Total number of items across all pages
    pub count: u64,
    /// URL of the next page, if any
    pub next: Option<String>,
    /// URL of the previous page, if any
    pub previous: Option<String>,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wraps a full, unpaginated list.
    pub fn from_items(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }

    /// Whether there are more items after this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaginatedRepr<T> {
    Envelope {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<'de, T> Deserialize<'de> for Paginated<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match PaginatedRepr::deserialize(deserializer)? {
            PaginatedRepr::Envelope {
                count,
                next,
                previous,
                results,
            } => Ok(Self {
                count: count.unwrap_or(results.len() as u64),
                next,
                previous,
                results,
            }),
            PaginatedRepr::Bare(results) => Ok(Self::from_items(results)),
        }
    }
}

/// Page-number query parameters.
///
/// # Limits
///
/// - `page_size` is clamped to the range [1, 100]
/// - `page` is clamped to a minimum of 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PageQuery {
    pub fn first(page_size: u32) -> Self {
        Self {
            page: Some(1),
            page_size: Some(page_size),
        }
    }

    /// Returns the effective page number (1-indexed).
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Returns the effective page size, clamped to [1, 100].
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Query for the page after this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: Some(self.page() + 1),
            page_size: Some(self.page_size()),
        }
    }

    /// Normalized query pairs, ready to append to a request.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page().to_string()),
            ("page_size", self.page_size().to_string()),
        ]
    }
}
