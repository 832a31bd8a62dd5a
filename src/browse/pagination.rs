use serde::Serialize;

use crate::seatgeek::models::Meta;

/// Page position within a listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub per_page: u32,
    pub page: u32,
}

impl Pagination {
    pub fn new(total: u64, per_page: u32, page: u32) -> Self {
        Self {
            total,
            per_page,
            page: page.max(1),
        }
    }

    pub fn from_meta(meta: &Meta) -> Self {
        Self::new(meta.total, meta.per_page, meta.page)
    }

    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    pub fn is_first_page(&self) -> bool {
        self.page <= 1
    }

    /// Also true for an empty listing, so "next" is never offered there.
    pub fn is_last_page(&self) -> bool {
        u64::from(self.page) >= self.total_pages()
    }

    pub fn next(self) -> Self {
        if self.is_last_page() {
            return self;
        }
        Self {
            page: self.page + 1,
            ..self
        }
    }

    pub fn previous(self) -> Self {
        if self.is_first_page() {
            return self;
        }
        Self {
            page: self.page - 1,
            ..self
        }
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Pagination::new(240, 24, 1).total_pages(), 10);
        assert_eq!(Pagination::new(241, 24, 1).total_pages(), 11);
        assert_eq!(Pagination::new(5, 0, 1).total_pages(), 0);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let first = Pagination::new(50, 24, 1);
        assert!(first.is_first_page());
        assert_eq!(first.previous(), first);

        let last = first.next().next();
        assert_eq!(last.page, 3);
        assert!(last.is_last_page());
        assert_eq!(last.next(), last);
        assert_eq!(last.label(), "Page 3 of 3");
    }

    #[test]
    fn test_empty_listing() {
        let empty = Pagination::new(0, 24, 1);
        assert!(empty.is_first_page());
        assert!(empty.is_last_page());
        assert_eq!(empty.label(), "Page 1 of 0");
    }

    #[test]
    fn test_from_meta() {
        let meta = Meta {
            total: 100,
            per_page: 24,
            page: 0,
        };
        assert_eq!(Pagination::from_meta(&meta), Pagination::new(100, 24, 1));
    }
}
