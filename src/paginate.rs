//! Page slicing and navigation bounds.

use crate::render::format;
use serde::Serialize;

/// Number of page links shown at most.
const WINDOW: usize = 5;

/// The current page (1-based) and the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageState {
    page: usize,
    size: usize,
}

impl PageState {
    /// A size of zero is treated as one.
    pub fn new(size: usize) -> Self {
        Self {
            page: 1,
            size: size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Goes back to the first page.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Moves to `page` if it exists for a collection of `count` records. Returns `false` and
    /// leaves the state unchanged otherwise.
    pub fn goto(&mut self, page: usize, count: usize) -> bool {
        if page >= 1 && page <= total_pages(count, self.size) {
            self.page = page;
            true
        } else {
            false
        }
    }
}

fn total_pages(count: usize, size: usize) -> usize {
    count.div_ceil(size.max(1))
}

/// The slice of a filtered collection that is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// First index shown.
    pub start: usize,
    /// One past the last index shown.
    pub end: usize,
    pub current: usize,
    pub total_pages: usize,
    pub count: usize,
}

impl Page {
    pub fn new(count: usize, state: &PageState) -> Self {
        let total_pages = total_pages(count, state.size);
        let start = (state.page.saturating_sub(1) * state.size).min(count);
        let end = (start + state.size).min(count);
        Self {
            start,
            end,
            current: state.page,
            total_pages,
            count,
        }
    }

    /// Whether navigation controls are shown.
    pub fn has_navigation(&self) -> bool {
        self.total_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }

    /// The page numbers to link, at most five, around the current page.
    pub fn window(&self) -> std::ops::RangeInclusive<usize> {
        if self.total_pages == 0 {
            return 1..=0;
        }
        let mut first = self.current.saturating_sub(2).max(1);
        let last = (first + WINDOW - 1).min(self.total_pages);
        if last + 1 - first < WINDOW {
            first = (last + 1).saturating_sub(WINDOW).max(1);
        }
        first..=last
    }

    /// `"101-120 von 120"`, or `"0 von 0"` for an empty collection.
    pub fn range_label(&self) -> String {
        if self.count == 0 {
            return "0 von 0".to_string();
        }
        format!(
            "{}-{} von {}",
            format::count_usize(self.start + 1),
            format::count_usize(self.end),
            format::count_usize(self.count)
        )
    }

    /// The records of this page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        &items[self.start.min(end)..end]
    }
}
