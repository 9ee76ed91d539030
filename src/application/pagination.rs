//! Numbered-page pagination helpers.
//!
//! Feeds are addressed by a 1-based `?page=N` query parameter at a fixed
//! page size. Out-of-range pages are served as empty pages with consistent
//! metadata rather than errors.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A 1-based page number parsed from the request query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(u32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    pub fn new(number: u32) -> Self {
        Self(number.max(1))
    }

    /// Parse the raw `page` query value; anything unparseable falls back to
    /// the first page, matching lenient form handling elsewhere.
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<u32>().ok())
            .map(Self::new)
            .unwrap_or(Self::FIRST)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// A bounded window over an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: PageNumber,
    pub size: u32,
}

impl PageRequest {
    pub fn new(number: PageNumber, size: u32) -> Self {
        Self {
            number,
            size: size.max(1),
        }
    }

    pub fn first(size: u32) -> Self {
        Self::new(PageNumber::FIRST, size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number.get() - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> u32 {
        self.size
    }
}

/// One page of results plus the metadata needed to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            number: request.number.get(),
            size: request.size,
            total_items,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Total page count; an empty collection still has one (empty) page.
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.size.max(1));
        let pages = self.total_items.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_parses_query_values() {
        assert_eq!(PageNumber::from_query(Some("3")).get(), 3);
        assert_eq!(PageNumber::from_query(Some(" 2 ")).get(), 2);
        assert_eq!(PageNumber::from_query(None).get(), 1);
        assert_eq!(PageNumber::from_query(Some("zero")).get(), 1);
        assert_eq!(PageNumber::from_query(Some("0")).get(), 1);
        assert_eq!(PageNumber::from_query(Some("-4")).get(), 1);
    }

    #[test]
    fn request_offset_advances_by_page_size() {
        let request = PageRequest::new(PageNumber::new(2), 10);
        assert_eq!(request.offset(), 10);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn twelve_items_at_size_ten_leave_two_on_page_two() {
        let request = PageRequest::new(PageNumber::new(2), 10);
        let page = Page::new(vec!["k".to_string(); 2], request, 12);

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 2);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn empty_collection_is_one_empty_page() {
        let page: Page<u8> = Page::empty(PageRequest::first(10));
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_previous());
        assert!(!page.has_next());
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_past_the_end_keeps_metadata_consistent() {
        let request = PageRequest::new(PageNumber::new(9), 10);
        let page: Page<u8> = Page::new(Vec::new(), request, 12);
        assert_eq!(page.total_pages(), 2);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }
}
