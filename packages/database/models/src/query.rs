//! Predicate, ordering, and pagination types for incident queries.
//!
//! A [`DenunciaFilter`] is a conjunction: every populated field must match
//! for a row to be selected, and an empty filter selects every row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, DenunciaRow};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Hard cap on the client-requested page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// How the category predicate compares values. Both variants are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMatch {
    /// Whole-value match.
    Exact(String),
    /// Substring match.
    Contains(String),
}

impl CategoryMatch {
    /// Returns whether `categoria` satisfies this predicate.
    #[must_use]
    pub fn matches(&self, categoria: &str) -> bool {
        let haystack = categoria.to_lowercase();
        match self {
            Self::Exact(needle) => haystack == needle.to_lowercase(),
            Self::Contains(needle) => haystack.contains(&needle.to_lowercase()),
        }
    }
}

/// Conjunctive predicate set over incident rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenunciaFilter {
    /// Spatial bounding box (boundary inclusive).
    pub bbox: Option<BoundingBox>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    /// Exact raw status value.
    pub status: Option<String>,
    /// Category predicate.
    pub category: Option<CategoryMatch>,
}

impl DenunciaFilter {
    /// Whether a `created_at` bound is present.
    #[must_use]
    pub const fn has_temporal(&self) -> bool {
        self.created_from.is_some() || self.created_to.is_some()
    }

    /// Returns this filter restricted to `[from, to]` on `created_at`.
    #[must_use]
    pub fn with_created_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    /// Evaluates the predicate against a row.
    #[must_use]
    pub fn matches(&self, row: &DenunciaRow) -> bool {
        if let Some(bbox) = &self.bbox
            && !bbox.contains(row.longitude, row.latitude)
        {
            return false;
        }
        if let Some(from) = self.created_from
            && row.created_at < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && row.created_at > to
        {
            return false;
        }
        if let Some(status) = &self.status
            && row.status.as_str() != status
        {
            return false;
        }
        if let Some(category) = &self.category
            && !category.matches(&row.categoria)
        {
            return false;
        }
        true
    }
}

/// Result ordering by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    CreatedDesc,
    /// Oldest first.
    CreatedAsc,
}

/// Offset/limit slice of an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Window {
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return; `None` returns everything after `offset`.
    pub limit: Option<u64>,
}

impl Window {
    /// The whole result set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// The first `limit` rows.
    #[must_use]
    pub const fn first(limit: u64) -> Self {
        Self {
            offset: 0,
            limit: Some(limit),
        }
    }
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u64,
    /// Rows per page, in `1..=MAX_PAGE_SIZE`.
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping `page_size` to
    /// `1..=MAX_PAGE_SIZE` and `page` to at least 1.
    #[must_use]
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The store window covering this page.
    #[must_use]
    pub const fn window(&self) -> Window {
        Window {
            offset: self.page.saturating_sub(1).saturating_mul(self.page_size),
            limit: Some(self.page_size),
        }
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of rows matching the filter.
    pub count: u64,
    /// Page number that was requested.
    pub page: u64,
    /// Page size that was applied.
    pub page_size: u64,
    /// Rows on this page; empty when the page is out of range.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether pages exist after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page.saturating_mul(self.page_size) < self.count
    }

    /// Maps every row on the page.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
