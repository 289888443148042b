//! Paginated list view state.
//!
//! [`ListState`] holds what a list screen renders: the loaded items, the
//! active filters, pagination progress, a loading flag and a user-facing
//! error message. Fetch failures are converted to messages and stored; they
//! are never propagated, so a failed refresh leaves the previous items on
//! screen.
//!
//! The fetch itself is supplied per call, which keeps the state independent
//! of any particular service:
//!
//! ```ignore
//! let mut students = ListState::<Student, StudentFilterParams>::new(20);
//! students
//!     .refresh(|filters, page| async move { StudentService::list(&api, &filters, page).await })
//!     .await;
//! ```

use std::future::Future;

use tracing::warn;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_core::pagination::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone)]
pub struct ListState<T, F> {
    items: Vec<T>,
    filters: F,
    page_size: u32,
    /// Last page successfully loaded; `None` before the first load.
    page: Option<PageQuery>,
    count: u64,
    has_more: bool,
    loading: bool,
    error: Option<String>,
}

impl<T, F: Default> Default for ListState<T, F> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<T, F: Default> ListState<T, F> {
    pub fn new(page_size: u32) -> Self {
        Self::with_filters(F::default(), page_size)
    }
}

impl<T, F> ListState<T, F> {
    pub fn with_filters(filters: F, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            filters,
            page_size,
            page: None,
            count: 0,
            has_more: false,
            loading: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    /// Total number of items on the backend, across pages.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Records a failure from an operation outside the list fetch itself
    /// (e.g. a row action).
    pub fn set_error(&mut self, error: &ApiError) {
        self.error = Some(error.user_message());
    }

    /// Number of the last page loaded (0 before the first load).
    pub fn page(&self) -> u32 {
        self.page.map(|p| p.page()).unwrap_or(0)
    }

    /// Replaces the filters and forgets loaded pages. The next
    /// [`refresh`](Self::refresh) starts again from page 1.
    pub fn set_filters(&mut self, filters: F) {
        self.filters = filters;
        self.items.clear();
        self.page = None;
        self.count = 0;
        self.has_more = false;
        self.error = None;
    }

    pub fn filters_mut(&mut self) -> &mut F {
        &mut self.filters
    }

    /// Applies `update` to every loaded item matching `predicate`.
    pub fn update_where<P, U>(&mut self, predicate: P, mut update: U) -> usize
    where
        P: Fn(&T) -> bool,
        U: FnMut(&mut T),
    {
        let mut updated = 0;
        for item in self.items.iter_mut().filter(|item| predicate(&**item)) {
            update(item);
            updated += 1;
        }
        updated
    }

    /// Removes loaded items matching `predicate`, adjusting the total count.
    pub fn remove_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        let removed = before - self.items.len();
        self.count = self.count.saturating_sub(removed as u64);
        removed
    }
}

impl<T, F: Clone> ListState<T, F> {
    /// Reloads from page 1, replacing the items. Returns whether the fetch
    /// succeeded.
    pub async fn refresh<Fetch, Fut>(&mut self, fetch: Fetch) -> bool
    where
        Fetch: FnOnce(F, PageQuery) -> Fut,
        Fut: Future<Output = Result<Paginated<T>, ApiError>>,
    {
        let query = PageQuery::first(self.page_size);
        self.load(query, fetch, false).await
    }

    /// Appends the next page. Does nothing when there is no next page or a
    /// load is already in progress.
    pub async fn load_more<Fetch, Fut>(&mut self, fetch: Fetch) -> bool
    where
        Fetch: FnOnce(F, PageQuery) -> Fut,
        Fut: Future<Output = Result<Paginated<T>, ApiError>>,
    {
        if !self.has_more || self.loading {
            return false;
        }
        let query = match self.page {
            Some(page) => page.next(),
            None => PageQuery::first(self.page_size),
        };
        self.load(query, fetch, true).await
    }

    async fn load<Fetch, Fut>(&mut self, query: PageQuery, fetch: Fetch, append: bool) -> bool
    where
        Fetch: FnOnce(F, PageQuery) -> Fut,
        Fut: Future<Output = Result<Paginated<T>, ApiError>>,
    {
        self.loading = true;
        let result = fetch(self.filters.clone(), query).await;
        self.loading = false;

        match result {
            Ok(page) => {
                self.count = page.count;
                self.has_more = page.has_more();
                if append {
                    self.items.extend(page.results);
                } else {
                    self.items = page.results;
                }
                self.page = Some(query);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(page = query.page(), error = %e, "List fetch failed");
                self.error = Some(e.user_message());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Filters {
        search: Option<String>,
    }

    /// Serves `total` numbered items in pages, optionally failing.
    fn source(
        total: u32,
        fail: bool,
    ) -> impl FnOnce(Filters, PageQuery) -> std::future::Ready<Result<Paginated<u32>, ApiError>> {
        move |_filters, query| {
            if fail {
                return std::future::ready(Err(ApiError::from_response(503, "")));
            }
            let start = (query.page() - 1) * query.page_size();
            let end = (start + query.page_size()).min(total);
            std::future::ready(Ok(Paginated {
                count: total as u64,
                next: (end < total).then(|| "next".to_string()),
                previous: None,
                results: (start..end).collect(),
            }))
        }
    }

    #[tokio::test]
    async fn test_refresh_then_load_more() {
        let mut state = ListState::<u32, Filters>::new(2);
        assert!(state.refresh(source(5, false)).await);
        assert_eq!(state.items(), &[0, 1]);
        assert_eq!(state.count(), 5);
        assert!(state.has_more());

        assert!(state.load_more(source(5, false)).await);
        assert!(state.load_more(source(5, false)).await);
        assert_eq!(state.items(), &[0, 1, 2, 3, 4]);
        assert_eq!(state.page(), 3);
        assert!(!state.has_more());
        assert!(!state.load_more(source(5, false)).await);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_items_and_stores_message() {
        let mut state = ListState::<u32, Filters>::new(2);
        state.refresh(source(3, false)).await;

        assert!(!state.refresh(source(3, true)).await);
        assert_eq!(state.items(), &[0, 1]);
        assert_eq!(
            state.error(),
            Some("The server encountered an error. Please try again later.")
        );
        assert!(!state.is_loading());

        state.refresh(source(3, false)).await;
        assert_eq!(state.error(), None);
    }

    #[tokio::test]
    async fn test_set_filters_resets_pagination() {
        let mut state = ListState::<u32, Filters>::new(2);
        state.refresh(source(5, false)).await;
        state.load_more(source(5, false)).await;

        state.set_filters(Filters {
            search: Some("ada".to_string()),
        });
        assert!(state.items().is_empty());
        assert_eq!(state.page(), 0);
        assert!(!state.has_more());

        let mut seen = None;
        state
            .refresh(|filters, page| {
                seen = Some((filters, page.page()));
                source(5, false)(Filters::default(), page)
            })
            .await;
        assert_eq!(
            seen,
            Some((
                Filters {
                    search: Some("ada".to_string())
                },
                1
            ))
        );
    }

    #[tokio::test]
    async fn test_local_updates_and_removals() {
        let mut state = ListState::<u32, Filters>::new(10);
        state.refresh(source(4, false)).await;

        assert_eq!(state.update_where(|n| *n % 2 == 0, |n| *n += 100), 2);
        assert_eq!(state.items(), &[100, 1, 102, 3]);

        assert_eq!(state.remove_where(|n| *n > 100), 2);
        assert_eq!(state.items(), &[1, 3]);
        assert_eq!(state.count(), 2);
    }
}
