//! Page requests and paged results.

/// Page number used when the caller passes zero or a negative number.
pub const DEFAULT_PAGE_NUMBER: u64 = 1;
/// Page size used when the caller passes zero or a negative size.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A one-based page request. Always holds positive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page_number: u64,
    page_size: u64,
}

impl PageRequest {
    /// Create a page request, replacing non-positive values with the defaults.
    pub fn of(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number: if page_number <= 0 {
                DEFAULT_PAGE_NUMBER
            } else {
                page_number as u64
            },
            page_size: if page_size <= 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size as u64
            },
        }
    }

    /// One-based page number.
    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    /// Number of hits per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Zero-based offset of the first hit on this page.
    pub fn from(&self) -> u64 {
        self.page_size.saturating_mul(self.page_number - 1)
    }

    /// The following page.
    pub fn next(&self) -> Self {
        Self {
            page_number: self.page_number.saturating_add(1),
            ..*self
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    page_request: PageRequest,
    total_hits: u64,
}

impl<T> Page<T> {
    /// Create a page.
    pub fn new(content: Vec<T>, page_request: PageRequest, total_hits: u64) -> Self {
        Self {
            content,
            page_request,
            total_hits,
        }
    }

    /// Items on this page, in response order.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Take the items.
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// The request this page answers.
    pub fn page_request(&self) -> &PageRequest {
        &self.page_request
    }

    /// Total hits reported by the store across all pages.
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    /// Items on this page.
    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    /// Whether this page has no items.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of pages needed for all hits at this page size.
    pub fn total_pages(&self) -> u64 {
        self.total_hits.div_ceil(self.page_request.page_size)
    }

    /// Whether a later page holds hits.
    pub fn has_next(&self) -> bool {
        self.page_request.page_number < self.total_pages()
    }

    /// Whether this is not the first page.
    pub fn has_previous(&self) -> bool {
        self.page_request.page_number > 1
    }

    /// Map the items, keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_request: self.page_request,
            total_hits: self.total_hits,
        }
    }
}
