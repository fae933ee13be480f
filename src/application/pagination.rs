//! Page-number pagination shared by every listing.
//!
//! Page numbers arrive straight from the query string, so resolution never
//! fails: missing or malformed numbers (and anything below one) land on the
//! first page, numbers past the end land on the last page. An empty sequence
//! still has exactly one (empty) page.

use std::num::NonZeroU32;

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// A resolved slice of an ordered sequence, ready to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number after clamping.
    pub number: u32,
    pub offset: u64,
    pub limit: u32,
}

/// One page of an ordered sequence together with its position metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub page_count: u32,
}

impl<T> Page<T> {
    pub fn empty(per_page: NonZeroU32) -> Self {
        Self {
            items: Vec::new(),
            number: 1,
            per_page: per_page.get(),
            total_count: 0,
            page_count: 1,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.page_count
    }

    pub fn prev_number(&self) -> Option<u32> {
        self.has_prev().then(|| self.number - 1)
    }

    pub fn next_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: NonZeroU32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(per_page: NonZeroU32) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> NonZeroU32 {
        self.per_page
    }

    /// Number of pages needed for `total` items; never less than one.
    pub fn page_count(&self, total: u64) -> u32 {
        let per_page = u64::from(self.per_page.get());
        let pages = total.div_ceil(per_page).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve an untrusted page number against a sequence of `total` items.
    pub fn window(&self, total: u64, requested: Option<&str>) -> PageWindow {
        let last = self.page_count(total);
        let number = parse_page_number(requested).min(last);
        let limit = self.per_page.get();
        PageWindow {
            number,
            offset: u64::from(number - 1) * u64::from(limit),
            limit,
        }
    }

    /// Assemble a page from a window and the items fetched for it.
    pub fn page<T>(&self, window: PageWindow, total: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: window.number,
            per_page: self.per_page.get(),
            total_count: total,
            page_count: self.page_count(total),
        }
    }

    /// Slice an already materialized, ordered sequence.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let total = items.len() as u64;
        let window = self.window(total, requested);
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let slice = items
            .into_iter()
            .skip(offset)
            .take(window.limit as usize)
            .collect();
        self.page(window, total, slice)
    }
}

/// Interpret a raw `page` query value; anything unusable means page one.
pub fn parse_page_number(raw: Option<&str>) -> u32 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value >= 1)
        .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator() -> Paginator {
        Paginator::new(NonZeroU32::new(10).unwrap())
    }

    #[test]
    fn thirty_four_items_make_four_pages() {
        let items: Vec<u32> = (0..34).collect();
        let p = paginator();

        let first = p.paginate(items.clone(), Some("1"));
        assert_eq!(first.len(), 10);
        assert_eq!(first.page_count, 4);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = p.paginate(items.clone(), Some("4"));
        assert_eq!(last.items, vec![30, 31, 32, 33]);
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn pages_beyond_the_end_clamp_to_last_page() {
        let items: Vec<u32> = (0..34).collect();
        let p = paginator();

        for requested in ["5", "99", "4294967296"] {
            let page = p.paginate(items.clone(), Some(requested));
            assert_eq!(page.number, 4, "requested {requested}");
            assert_eq!(page.len(), 4);
        }
    }

    #[test]
    fn malformed_page_numbers_fall_back_to_first_page() {
        let items: Vec<u32> = (0..34).collect();
        let p = paginator();

        for requested in [None, Some(""), Some("abc"), Some("0"), Some("-3"), Some("2.5")] {
            let page = p.paginate(items.clone(), requested);
            assert_eq!(page.number, 1, "requested {requested:?}");
            assert_eq!(page.items.first(), Some(&0));
        }
    }

    #[test]
    fn pages_are_contiguous_and_disjoint() {
        let items: Vec<u32> = (0..34).collect();
        let p = paginator();

        let mut seen = Vec::new();
        for number in 1..=p.page_count(34) {
            let page = p.paginate(items.clone(), Some(number.to_string().as_str()));
            seen.extend(page.items);
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn empty_sequence_has_one_empty_page() {
        let page = paginator().paginate(Vec::<u32>::new(), Some("3"));
        assert_eq!(page.number, 1);
        assert_eq!(page.page_count, 1);
        assert!(page.is_empty());
        assert!(!page.has_next());
        assert_eq!(page, Page::empty(DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn window_offsets_follow_page_number() {
        let window = paginator().window(35, Some("4"));
        assert_eq!(
            window,
            PageWindow {
                number: 4,
                offset: 30,
                limit: 10
            }
        );
    }

    #[test]
    fn same_request_returns_same_items() {
        let items: Vec<u32> = (0..34).collect();
        let p = paginator();
        assert_eq!(
            p.paginate(items.clone(), Some("2")),
            p.paginate(items, Some("2"))
        );
    }
}
