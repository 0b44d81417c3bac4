use shared::{domain::Visit, protocol::DEFAULT_HISTORY_LIMIT};

use crate::{error::ClientError, DoorbellApi};

/// Rows from the end of the list at which the next page is requested.
pub const PREFETCH_THRESHOLD: usize = 5;

/// Paging state for an append-only visit list.
///
/// The offset only moves by the number of visits actually received, so re-requesting
/// after an error or walking a stable data set never skips or repeats a visit.
#[derive(Debug, Clone)]
pub struct HistoryPager {
    page_size: u32,
    offset: u32,
    has_more: bool,
    loading: bool,
    first_page_empty: bool,
    visits: Vec<Visit>,
}

impl Default for HistoryPager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryPager {
    pub fn new(page_size: u32) -> Self {
        Self::starting_at(page_size, 0)
    }

    pub fn starting_at(page_size: u32, offset: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            offset,
            has_more: true,
            loading: false,
            first_page_empty: false,
            visits: Vec::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// True when a walk starting at offset 0 got an empty first page.
    pub fn is_empty_history(&self) -> bool {
        self.first_page_empty
    }

    /// `(limit, offset)` for the next page, or `None` while a page is in flight or the end
    /// was reached. Marks the pager as loading.
    pub fn next_request(&mut self) -> Option<(u32, u32)> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some((self.page_size, self.offset))
    }

    /// Records a received page and returns how many visits were appended.
    pub fn apply_page(&mut self, page: Vec<Visit>) -> usize {
        self.loading = false;
        if page.is_empty() {
            if self.offset == 0 {
                self.first_page_empty = true;
            }
            self.has_more = false;
            return 0;
        }

        let received = page.len();
        if received < self.page_size as usize {
            self.has_more = false;
        }
        self.offset = self.offset.saturating_add(received as u32);
        self.visits.extend(page);
        received
    }

    /// A failed page leaves the position untouched so the same page can be retried.
    pub fn apply_error(&mut self) {
        self.loading = false;
    }

    /// Whether scrolling to show rows `first_visible..first_visible + visible` should
    /// trigger the next page.
    pub fn should_prefetch(&self, visible: usize, first_visible: usize) -> bool {
        !self.loading
            && self.has_more
            && visible + first_visible + PREFETCH_THRESHOLD >= self.visits.len()
    }

    /// Fetches the next page through `api`. Returns `Ok(None)` when nothing was requested.
    pub async fn load_next<A>(&mut self, api: &A) -> Result<Option<usize>, ClientError>
    where
        A: DoorbellApi + ?Sized,
    {
        let Some((limit, offset)) = self.next_request() else {
            return Ok(None);
        };
        match api.visit_history(limit, offset).await {
            Ok(page) => Ok(Some(self.apply_page(page))),
            Err(err) => {
                self.apply_error();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::VisitId;

    use super::*;

    fn page(ids: std::ops::Range<i64>) -> Vec<Visit> {
        ids.map(|id| Visit {
            id: VisitId(id),
            photo_url: None,
            photo_download_url: None,
            timestamp: "2025-01-01T00:00:00".into(),
        })
        .collect()
    }

    #[test]
    fn offset_advances_by_received_count() {
        let mut pager = HistoryPager::new(3);
        assert_eq!(pager.next_request(), Some((3, 0)));
        assert_eq!(pager.next_request(), None, "in flight");
        assert_eq!(pager.apply_page(page(0..3)), 3);
        assert!(pager.has_more());

        assert_eq!(pager.next_request(), Some((3, 3)));
        assert_eq!(pager.apply_page(page(3..5)), 2);
        assert_eq!(pager.offset(), 5);
        assert!(!pager.has_more(), "short page ends the history");
        assert_eq!(pager.next_request(), None);
        assert!(!pager.is_empty_history());
        assert_eq!(pager.visits().len(), 5);
    }

    #[test]
    fn empty_first_page_is_reported_as_empty_history() {
        let mut pager = HistoryPager::default();
        assert_eq!(pager.next_request(), Some((20, 0)));
        assert_eq!(pager.apply_page(Vec::new()), 0);
        assert!(pager.is_empty_history());
        assert!(!pager.has_more());
    }

    #[test]
    fn empty_later_page_only_ends_paging() {
        let mut pager = HistoryPager::new(2);
        pager.next_request();
        pager.apply_page(page(0..2));
        pager.next_request();
        pager.apply_page(Vec::new());
        assert!(!pager.has_more());
        assert!(!pager.is_empty_history());
    }

    #[test]
    fn empty_page_past_the_end_is_not_empty_history() {
        let mut pager = HistoryPager::starting_at(20, 5);
        assert_eq!(pager.next_request(), Some((20, 5)));
        pager.apply_page(Vec::new());
        assert!(!pager.has_more());
        assert!(!pager.is_empty_history());
    }

    #[test]
    fn error_keeps_position_for_retry() {
        let mut pager = HistoryPager::new(2);
        pager.next_request();
        pager.apply_page(page(0..2));
        assert_eq!(pager.next_request(), Some((2, 2)));
        pager.apply_error();
        assert!(!pager.is_loading());
        assert_eq!(pager.next_request(), Some((2, 2)));
    }

    #[test]
    fn prefetch_triggers_near_end_of_list() {
        let mut pager = HistoryPager::new(20);
        pager.next_request();
        pager.apply_page(page(0..20));
        assert!(!pager.should_prefetch(8, 0));
        assert!(pager.should_prefetch(8, 7));

        pager.next_request();
        assert!(!pager.should_prefetch(8, 12), "already loading");
    }
}
