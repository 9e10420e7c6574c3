//! Page-number pagination for listing pages and admin tables.

use serde::Serialize;

/// Pagination state for one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page (1-based).
    pub page: u32,
    /// Records per page.
    pub per_page: u32,
    /// Total records across all pages.
    pub total: u64,
}

impl Pagination {
    /// Build pagination state. A zero page size is treated as 1 and the page
    /// is clamped to `1..=total_pages()`.
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let mut state = Self {
            page: 1,
            per_page: per_page.max(1),
            total,
        };
        state.page = page.clamp(1, state.total_pages());
        state
    }

    /// Number of pages, never less than 1.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.per_page)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether a "previous" control should be enabled.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether a "next" control should be enabled.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    #[must_use]
    pub const fn previous_page(&self) -> Option<u32> {
        if self.has_previous() {
            Some(self.page - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        self.has_next().then_some(self.page + 1)
    }

    /// Page numbers within `radius` of the current page.
    #[must_use]
    pub fn window(&self, radius: u32) -> Vec<u32> {
        let last = self.total_pages();
        let start = self.page.saturating_sub(radius).max(1);
        let end = self.page.saturating_add(radius).min(last);
        (start..=end).collect()
    }

    /// 1-based index of the first record on this page (0 when empty).
    #[must_use]
    pub fn first_index(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            u64::from(self.page - 1) * u64::from(self.per_page) + 1
        }
    }

    /// 1-based index of the last record on this page.
    #[must_use]
    pub fn last_index(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.per_page)).min(self.total)
    }

    /// Resolve the pagination controls into links, using `href` to build the
    /// URL for a page number.
    #[must_use]
    pub fn links(&self, radius: u32, href: impl Fn(u32) -> String) -> PageLinks {
        PageLinks {
            previous: self.previous_page().map(&href),
            next: self.next_page().map(&href),
            pages: self
                .window(radius)
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    current: number == self.page,
                })
                .collect(),
            total_pages: self.total_pages(),
            first_index: self.first_index(),
            last_index: self.last_index(),
            total: self.total,
        }
    }
}

/// Rendered pagination controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    /// Link to the previous page; `None` renders a disabled control.
    pub previous: Option<String>,
    /// Link to the next page; `None` renders a disabled control.
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
    pub total_pages: u32,
    /// First record shown, 1-based (0 when empty).
    pub first_index: u64,
    /// Last record shown.
    pub last_index: u64,
    pub total: u64,
}

impl PageLinks {
    /// Whether there is more than one page to show.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_disables_previous() {
        let p = Pagination::new(1, 10, 35);
        assert!(!p.has_previous());
        assert_eq!(p.previous_page(), None);
        assert!(p.has_next());
        assert_eq!(p.next_page(), Some(2));
    }

    #[test]
    fn test_last_page_disables_next() {
        let p = Pagination::new(4, 10, 35);
        assert_eq!(p.total_pages(), 4);
        assert!(!p.has_next());
        assert_eq!(p.next_page(), None);
        assert!(p.has_previous());
    }

    #[test]
    fn test_empty_result_has_single_page() {
        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.total_pages(), 1);
        assert!(!p.has_previous());
        assert!(!p.has_next());
        assert_eq!(p.first_index(), 0);
        assert_eq!(p.last_index(), 0);
    }

    #[test]
    fn test_page_zero_is_clamped() {
        let p = Pagination::new(0, 0, 5);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);
        assert_eq!(p.total_pages(), 5);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(Pagination::new(1, 10, 100).window(2), vec![1, 2, 3]);
        assert_eq!(Pagination::new(5, 10, 100).window(2), vec![3, 4, 5, 6, 7]);
        assert_eq!(Pagination::new(10, 10, 100).window(2), vec![8, 9, 10]);
    }

    #[test]
    fn test_page_past_the_end_is_clamped() {
        let p = Pagination::new(99, 10, 20);
        assert_eq!(p.page, 2);
        assert_eq!(p.previous_page(), Some(1));
        assert_eq!(p.next_page(), None);
        assert_eq!(p.window(2), vec![1, 2]);
        assert_eq!(p.first_index(), 11);

        let links = p.links(2, |n| format!("?page={n}"));
        assert!(links.pages.iter().any(|l| l.current && l.number == 2));

        let empty = Pagination::new(99, 10, 0);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.previous_page(), None);
        assert_eq!(empty.window(2), vec![1]);
    }

    #[test]
    fn test_record_range() {
        let p = Pagination::new(2, 10, 15);
        assert_eq!(p.first_index(), 11);
        assert_eq!(p.last_index(), 15);
    }

    #[test]
    fn test_links() {
        let links = Pagination::new(2, 10, 35).links(1, |n| format!("/products?page={n}"));
        assert_eq!(links.previous.as_deref(), Some("/products?page=1"));
        assert_eq!(links.next.as_deref(), Some("/products?page=3"));
        assert_eq!(
            links.pages.iter().map(|p| p.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(links.pages[1].current);
        assert!(links.is_paginated());
        assert_eq!((links.first_index, links.last_index, links.total), (11, 20, 35));

        let single = Pagination::new(1, 10, 3).links(2, |n| n.to_string());
        assert_eq!(single.previous, None);
        assert_eq!(single.next, None);
        assert!(!single.is_paginated());
    }
}
