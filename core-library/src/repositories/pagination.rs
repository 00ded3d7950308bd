//! Offset pagination for repository listings

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

/// Page size used when the caller asks for zero items
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on any single listing
pub const MAX_PAGE_SIZE: u32 = 50;

/// Normalized pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    limit: u32,
    offset: u64,
}

impl PageRequest {
    /// Build a request, substituting the default for `0` and clamping to
    /// [`MAX_PAGE_SIZE`].
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// assert_eq!(PageRequest::new(0, 0).limit(), 20);
    /// assert_eq!(PageRequest::new(999, 0).limit(), 50);
    /// ```
    pub fn new(limit: u32, offset: u64) -> Self {
        let limit = match limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        Self { limit, offset }
    }

    /// Build a request from wire integers
    ///
    /// A non-positive limit selects the default; a negative offset is
    /// rejected.
    pub fn from_signed(limit: i64, offset: i64) -> Result<Self> {
        if offset < 0 {
            return Err(LibraryError::InvalidInput {
                field: "offset".to_string(),
                message: format!("must not be negative (got {})", offset),
            });
        }
        let limit = u32::try_from(limit.max(0)).unwrap_or(u32::MAX);
        Ok(Self::new(limit, offset as u64))
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

/// One slice of a listing plus the size of the whole table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            offset: request.offset(),
            limit: request.limit(),
        }
    }

    /// Whether rows exist past this slice
    pub fn has_next(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(PageRequest::new(0, 0).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(999, 0).limit(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(50, 0).limit(), 50);
        assert_eq!(PageRequest::new(7, 3).limit(), 7);
    }

    #[test]
    fn test_from_signed() {
        let request = PageRequest::from_signed(-5, 10).unwrap();
        assert_eq!(request.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(request.offset(), 10);

        let request = PageRequest::from_signed(i64::MAX, 0).unwrap();
        assert_eq!(request.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_negative_offset_is_rejected() {
        let err = PageRequest::from_signed(10, -1).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput { ref field, .. } if field == "offset"));
    }

    #[test]
    fn test_page_has_next() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(3, 0));
        assert!(page.has_next());

        let page = Page::new(vec![1], 25, PageRequest::new(3, 24));
        assert!(!page.has_next());

        let page: Page<i32> = Page::new(vec![], 5, PageRequest::new(10, 100));
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(10, 0));
        let mapped = page.map(|x| x * 2);

        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 25);
        assert_eq!(mapped.limit, 10);
    }
}
