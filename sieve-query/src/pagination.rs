//! Page requests and page results.
//!
//! ```rust
//! use sieve_query::{PageRequest, OrderByField};
//!
//! let request = PageRequest::of(2, 25).with_sort([OrderByField::asc("name")]);
//! assert_eq!(request.offset(), 50);
//! assert_eq!(request.to_sql(), "LIMIT 25 OFFSET 50");
//! ```
//!
//! A `PageRequest` is an immutable value: operations that change it return a
//! new request.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::types::OrderByField;

/// Page number, page size and ordered sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    size: u64,
    #[serde(default)]
    sort: Vec<OrderByField>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::of(0, 20)
    }
}

impl PageRequest {
    /// Create a request for a 0-indexed page.
    pub fn of(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Same page, replacing the sort keys.
    pub fn with_sort(&self, sort: impl IntoIterator<Item = OrderByField>) -> Self {
        Self {
            page: self.page,
            size: self.size,
            sort: sort.into_iter().collect(),
        }
    }

    /// The 0-indexed page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// The page size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The sort keys in priority order.
    pub fn sort(&self) -> &[OrderByField] {
        &self.sort
    }

    /// Number of records before this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// The request for the following page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    /// Generate SQL LIMIT/OFFSET clause.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(32);
        self.write_sql(&mut sql);
        sql
    }

    /// Write SQL LIMIT/OFFSET clause directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        let _ = write!(buffer, "LIMIT {}", self.size);
        let offset = self.offset();
        if offset > 0 {
            let _ = write!(buffer, " OFFSET {}", offset);
        }
    }
}

/// One page of results returned by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// The request that produced this page.
    pub request: PageRequest,
    /// Total number of matching records across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Create a page.
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            request,
            total,
        }
    }

    /// Total number of pages.
    pub fn total_pages(&self) -> u64 {
        if self.request.size() == 0 {
            return 0;
        }
        self.total.div_ceil(self.request.size())
    }

    /// Whether a following page exists.
    pub fn has_next(&self) -> bool {
        self.request.page().saturating_add(1) < self.total_pages()
    }

    /// Transform the records, keeping paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            request: self.request,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_has_no_offset() {
        assert_eq!(PageRequest::of(0, 10).to_sql(), "LIMIT 10");
    }

    #[test]
    fn test_with_sort_leaves_original_untouched() {
        let original = PageRequest::of(1, 10).with_sort([OrderByField::asc("name")]);
        let changed = original.with_sort([OrderByField::desc("age")]);
        assert_eq!(original.sort(), &[OrderByField::asc("name")]);
        assert_eq!(changed.sort(), &[OrderByField::desc("age")]);
        assert_eq!(changed.page(), 1);
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(vec![1, 2, 3], PageRequest::of(0, 3), 7);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let last = Page::new(vec![7], PageRequest::of(2, 3), 7);
        assert!(!last.has_next());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2], PageRequest::of(0, 2), 2).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 2);
    }
}
