//! Page arithmetic over an already-filtered result set.

use std::ops::Range;

/// Tracks the current page (1-indexed) of a result set of known size.
///
/// Navigation outside `1..=total_pages` is ignored: no error and no change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    items_per_page: usize,
    total_items: usize,
    current_page: usize,
}

impl Paginator {
    /// A zero page size is treated as one item per page.
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page: items_per_page.max(1),
            total_items: 0,
            current_page: 1,
        }
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.items_per_page)
    }

    /// Update the size of the result set.
    ///
    /// If the current page no longer exists it moves to the last page that
    /// does (or page 1 for an empty set).
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        let last = self.total_pages().max(1);
        if self.current_page > last {
            self.current_page = last;
        }
    }

    /// Move to `page`. Returns whether the page changed.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages() {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_page + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Index range of the current page within the full result set.
    pub fn page_range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.items_per_page).min(self.total_items);
        let end = (start + self.items_per_page).min(self.total_items);
        start..end
    }

    /// Slice the current page out of `items`.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = ((self.current_page - 1) * self.items_per_page).min(items.len());
        let end = (start + self.items_per_page).min(items.len());
        &items[start..end]
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(crate::connection::config::DEFAULT_ITEMS_PER_PAGE)
    }
}
