//! Slicing ordered listings into fixed-size pages.

use serde::Serialize;

/// A page location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// The page number.
    pub num: u32,
    /// How many items can fit in a page.
    pub width: u32,
}

impl Page {
    /// The offset in items to the start of the page.
    ///
    /// The offset to page 1 is 0.
    pub fn offset(&self) -> u32 {
        (self.num - 1) * self.width
    }
}

/// Where a page sits in a listing.
///
/// Built from the total item count before the items themselves are loaded,
/// so the page query can use the resolved number for its offset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// The resolved page number, always in `1..=total_pages`.
    pub num: u32,
    /// How many items can fit in a page.
    pub width: u32,
    /// How many items the whole listing has.
    pub total_items: i64,
    /// How many pages the whole listing has, at least 1.
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    /// The previous page number, if there is one.
    pub previous: Option<u32>,
    /// The next page number, if there is one.
    pub next: Option<u32>,
}

impl Pagination {
    /// Resolve a requested page number against a listing of `total_items`.
    ///
    /// A missing or invalid request maps to page 1 and an out-of-range
    /// request clamps to the last page. An empty listing still has one
    /// (empty) page.
    pub fn resolve(total_items: i64, width: u32, requested: Option<u32>) -> Pagination {
        let total_items = total_items.max(0);
        let width_wide = i64::from(width);
        let total_pages = ((total_items + width_wide - 1) / width_wide).max(1) as u32;

        let num = requested.filter(|&n| n >= 1).unwrap_or(1).min(total_pages);

        Pagination {
            num,
            width,
            total_items,
            total_pages,
            has_previous: num > 1,
            has_next: num < total_pages,
            previous: (num > 1).then(|| num - 1),
            next: (num < total_pages).then(|| num + 1),
        }
    }

    /// The page location to fetch for this slice.
    pub fn page(&self) -> Page {
        Page {
            num: self.num,
            width: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets() {
        assert_eq!(Page { num: 1, width: 10 }.offset(), 0);
        assert_eq!(Page { num: 2, width: 10 }.offset(), 10);
        assert_eq!(Page { num: 7, width: 3 }.offset(), 18);
    }

    #[test]
    fn total_pages_is_item_count_over_width_rounded_up() {
        assert_eq!(Pagination::resolve(0, 10, None).total_pages, 1);
        assert_eq!(Pagination::resolve(1, 10, None).total_pages, 1);
        assert_eq!(Pagination::resolve(10, 10, None).total_pages, 1);
        assert_eq!(Pagination::resolve(11, 10, None).total_pages, 2);
        assert_eq!(Pagination::resolve(20, 10, None).total_pages, 2);
        assert_eq!(Pagination::resolve(21, 10, None).total_pages, 3);
    }

    #[test]
    fn resolved_number_stays_in_range() {
        for total in 0..40 {
            for requested in [None, Some(0), Some(1), Some(2), Some(4), Some(u32::MAX)] {
                let pagination = Pagination::resolve(total, 10, requested);
                assert!(pagination.num >= 1);
                assert!(pagination.num <= pagination.total_pages);
            }
        }
    }

    #[test]
    fn missing_or_invalid_request_maps_to_page_one() {
        assert_eq!(Pagination::resolve(35, 10, None).num, 1);
        assert_eq!(Pagination::resolve(35, 10, Some(0)).num, 1);
    }

    #[test]
    fn out_of_range_request_clamps_to_last_page() {
        let pagination = Pagination::resolve(35, 10, Some(99));

        assert_eq!(pagination.num, 4);
        assert_eq!(pagination.total_pages, 4);
        assert!(pagination.has_previous);
        assert!(!pagination.has_next);
    }

    #[test]
    fn empty_listing_is_a_single_empty_page() {
        let pagination = Pagination::resolve(0, 10, None);

        assert_eq!(pagination.num, 1);
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.total_items, 0);
        assert!(!pagination.has_previous);
        assert!(!pagination.has_next);
        assert_eq!(pagination.previous, None);
        assert_eq!(pagination.next, None);
    }

    #[test]
    fn middle_page_has_both_neighbours() {
        let pagination = Pagination::resolve(35, 10, Some(2));

        assert_eq!(pagination.num, 2);
        assert!(pagination.has_previous);
        assert!(pagination.has_next);
        assert_eq!(pagination.previous, Some(1));
        assert_eq!(pagination.next, Some(3));
        assert_eq!(pagination.page().offset(), 10);
    }
}
