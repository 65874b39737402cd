//! Pagination window and previous/next availability

use serde::Serialize;

/// Navigation derived from the current page and the total page count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub total_pages: u32,
    /// Page numbers to render as links, ascending
    pub window: Vec<u32>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(current: u32, total_pages: u32, max_visible: u32) -> Self {
        Self {
            current,
            total_pages,
            window: page_window(current, total_pages, max_visible),
            has_previous: current > 1,
            has_next: current < total_pages,
        }
    }

    /// Target of the "previous" control, if enabled.
    pub fn previous(&self) -> Option<u32> {
        self.has_previous.then(|| self.current - 1)
    }

    /// Target of the "next" control, if enabled.
    pub fn next(&self) -> Option<u32> {
        self.has_next.then(|| self.current + 1)
    }
}

/// Sliding window of at most `max_visible` pages centred on `current`.
///
/// The window is pinned to the first pages near the start and to the last
/// pages near the end, and never leaves `1..=total_pages`.
pub fn page_window(current: u32, total_pages: u32, max_visible: u32) -> Vec<u32> {
    if total_pages == 0 || max_visible == 0 {
        return Vec::new();
    }

    let total = i64::from(total_pages);
    let visible = i64::from(max_visible);
    let centred = i64::from(current) - visible / 2;
    let start = centred.min(total - visible + 1).max(1);
    let end = (start + visible - 1).min(total);

    // Both bounds are within 1..=total_pages, so they fit back into u32.
    (start as u32..=end as u32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_at_start() {
        assert_eq!(page_window(1, 12, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(2, 12, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_window_in_middle() {
        assert_eq!(page_window(6, 12, 5), vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_window_at_end() {
        assert_eq!(page_window(10, 12, 5), vec![8, 9, 10, 11, 12]);
        assert_eq!(page_window(12, 12, 5), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_window_fewer_pages_than_visible() {
        for current in 1..=3 {
            assert_eq!(page_window(current, 3, 5), vec![1, 2, 3]);
        }
        assert_eq!(page_window(1, 5, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_window_no_pages() {
        assert!(page_window(1, 0, 5).is_empty());
    }

    #[test]
    fn test_out_of_range_current_stays_clipped() {
        assert_eq!(page_window(40, 12, 5), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_previous_and_next() {
        let first = Pagination::new(1, 5, 5);
        assert!(!first.has_previous);
        assert!(first.has_next);
        assert_eq!(first.previous(), None);
        assert_eq!(first.next(), Some(2));

        let last = Pagination::new(5, 5, 5);
        assert!(last.has_previous);
        assert!(!last.has_next);
        assert_eq!(last.previous(), Some(4));

        let single = Pagination::new(1, 1, 5);
        assert!(!single.has_previous && !single.has_next);
    }
}
