//! Paged result of a collection fetch

/// One page of a collection, as displayed
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,

    /// Total records across all pages
    pub total: u64,

    /// Total number of pages (at least 1)
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Build a page, deriving missing totals from what is known
    pub fn new(items: Vec<T>, total: Option<u64>, total_pages: Option<u32>, page_size: u32) -> Self {
        let total = total.unwrap_or(items.len() as u64);
        let total_pages = total_pages.unwrap_or_else(|| pages_for(total, page_size));
        Self {
            items,
            total,
            total_pages: total_pages.max(1),
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 1,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Number of pages needed for `total` records
pub fn pages_for(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}
