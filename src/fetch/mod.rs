//! Paginated listing search.
//!
//! A [`FetchController`] runs one search session at a time. Each session is
//! identified by its filter and sort order; starting a new one bumps a
//! generation counter, and any response tagged with an older generation is
//! dropped when it arrives. "Load more" pages belong to the session that was
//! current when they were requested and are serialized: only one is ever in
//! flight.
//!
//! State is never edited in place. Every transition builds a new
//! [`Snapshot`] and publishes it on a `watch` channel.
//!
//! A request future dropped before it completes (a timeout, a `select!`, a
//! view that went away) rolls the in-flight state back, so the controller
//! never stays stuck in `Loading` or `LoadingMore`.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ListPage, ListRequest, ListingApi, SortOrder};
use crate::error::{FetchError, ValidationError};
use crate::filter::{ListingScope, SearchFilter};
use crate::models::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    /// First page of a new session
    Loading,
    Ready,
    LoadingMore,
    /// First page failed; the list is empty
    Error,
}

/// Accumulated pages of the current session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationState {
    /// Offset of the last page that loaded
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
    /// In arrival order
    pub items: Vec<Listing>,
    pub last_page_size: u64,
}

impl PaginationState {
    fn empty(limit: u64) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn has_more(&self) -> bool {
        self.last_page_size > 0
            && self.offset + self.last_page_size < self.total
            && (self.items.len() as u64) < self.total
    }
}

/// What a session is searching for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub filter: SearchFilter,
    pub sort: SortOrder,
}

/// Immutable view of the controller after a transition
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub state: FetchState,
    pub session: Option<SessionKey>,
    pub page: PaginationState,
    /// Message for a transient notification about the last failure
    pub notice: Option<String>,
}

impl Snapshot {
    pub fn items(&self) -> &[Listing] {
        &self.page.items
    }

    pub fn has_more(&self) -> bool {
        self.page.has_more()
    }
}

/// Result of starting a session
#[derive(Debug)]
pub enum FetchOutcome {
    Loaded { received: usize, total: u64 },
    /// Same filter as the current session; nothing was requested
    Unchanged,
    /// A newer session started before this response arrived
    Discarded,
    Failed(FetchError),
}

/// Result of asking for the next page
#[derive(Debug)]
pub enum LoadMoreOutcome {
    Appended { received: usize, total: u64 },
    /// A page is already being fetched
    InFlight,
    /// No session is ready to extend
    NotReady,
    Exhausted,
    Discarded,
    /// Existing items were kept
    Failed(FetchError),
}

struct Inner {
    generation: u64,
    snapshot: Arc<Snapshot>,
}

pub struct FetchController<A> {
    api: Arc<A>,
    scope: ListingScope,
    limit: u64,
    inner: Mutex<Inner>,
    updates: watch::Sender<Arc<Snapshot>>,
}

impl<A: ListingApi> FetchController<A> {
    pub fn new(api: Arc<A>, scope: ListingScope, limit: u64) -> Self {
        let snapshot = Arc::new(Snapshot {
            generation: 0,
            state: FetchState::Idle,
            session: None,
            page: PaginationState::empty(limit),
            notice: None,
        });
        let (updates, _) = watch::channel(snapshot.clone());

        Self {
            api,
            scope,
            limit,
            inner: Mutex::new(Inner {
                generation: 0,
                snapshot,
            }),
            updates,
        }
    }

    pub fn scope(&self) -> &ListingScope {
        &self.scope
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.lock().snapshot.clone()
    }

    /// Receives every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.updates.subscribe()
    }

    /// Starts a session for `filter`, keeping the current sort order.
    ///
    /// Invalid filters are rejected before any request is made.
    pub async fn filter_changed(
        &self,
        filter: SearchFilter,
    ) -> Result<FetchOutcome, ValidationError> {
        let filter = self.scope.apply(filter.validate()?);
        let sort = self.current_sort();
        Ok(self.start_session(SessionKey { filter, sort }, false).await)
    }

    /// Starts a session with a new sort order for the current filter
    pub async fn sort_changed(&self, sort: SortOrder) -> FetchOutcome {
        let filter = self
            .snapshot()
            .session
            .as_ref()
            .map(|key| key.filter.clone())
            .unwrap_or_else(|| SearchFilter::cleared_for(&self.scope));
        self.start_session(SessionKey { filter, sort }, false).await
    }

    /// Re-runs the current session from the first page
    pub async fn retry(&self) -> FetchOutcome {
        let Some(key) = self.snapshot().session.clone() else {
            return FetchOutcome::Unchanged;
        };
        self.start_session(key, true).await
    }

    /// Fetches and appends the next page of the current session
    pub async fn load_more(&self) -> LoadMoreOutcome {
        let (rollback, request) = {
            let mut inner = self.lock();
            let current = inner.snapshot.clone();

            match current.state {
                FetchState::Ready => {}
                FetchState::LoadingMore => return LoadMoreOutcome::InFlight,
                _ => return LoadMoreOutcome::NotReady,
            }
            if !current.has_more() {
                return LoadMoreOutcome::Exhausted;
            }
            let Some(key) = current.session.clone() else {
                return LoadMoreOutcome::NotReady;
            };

            let request = ListRequest {
                filter: key.filter,
                scope: self.scope.clone(),
                sort: key.sort,
                offset: current.page.offset + self.limit,
                limit: self.limit,
            };
            self.publish(
                &mut inner,
                Snapshot {
                    state: FetchState::LoadingMore,
                    notice: None,
                    ..(*current).clone()
                },
            );
            let rollback = InFlight::new(self, inner.generation, FetchState::LoadingMore, current);
            (rollback, request)
        };
        let generation = rollback.generation;

        debug!(generation, offset = request.offset, "loading more listings");
        let result = self.api.listings(&request).await;
        rollback.disarm();

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "discarding stale page");
            return LoadMoreOutcome::Discarded;
        }
        let current = inner.snapshot.clone();

        match result {
            Ok(ListPage { data, total }) => {
                let received = data.len();
                let mut items = Vec::with_capacity(current.page.items.len() + received);
                items.extend(current.page.items.iter().cloned());
                items.extend(data);

                let page = PaginationState {
                    offset: request.offset,
                    limit: self.limit,
                    total,
                    items,
                    last_page_size: received as u64,
                };
                info!(
                    generation,
                    offset = page.offset,
                    loaded = page.items.len(),
                    total,
                    "appended listing page"
                );
                self.publish(
                    &mut inner,
                    Snapshot {
                        state: FetchState::Ready,
                        page,
                        notice: None,
                        ..(*current).clone()
                    },
                );
                LoadMoreOutcome::Appended { received, total }
            }
            Err(e) => {
                warn!(generation, offset = request.offset, "load more failed: {}", e);
                self.publish(
                    &mut inner,
                    Snapshot {
                        state: FetchState::Ready,
                        notice: Some(e.to_string()),
                        ..(*current).clone()
                    },
                );
                LoadMoreOutcome::Failed(e)
            }
        }
    }

    async fn start_session(&self, key: SessionKey, force: bool) -> FetchOutcome {
        let (rollback, request) = {
            let mut inner = self.lock();
            let current = inner.snapshot.clone();

            let same = current.session.as_ref() == Some(&key);
            if same && !force && current.state != FetchState::Error {
                debug!("filter unchanged, skipping fetch");
                return FetchOutcome::Unchanged;
            }

            inner.generation += 1;
            let generation = inner.generation;
            let request = ListRequest {
                filter: key.filter.clone(),
                scope: self.scope.clone(),
                sort: key.sort,
                offset: 0,
                limit: self.limit,
            };
            // An abandoned first page leaves the session retryable, like a failed one.
            let cancelled = Arc::new(Snapshot {
                generation,
                state: FetchState::Error,
                session: Some(key.clone()),
                page: PaginationState::empty(self.limit),
                notice: Some("search was cancelled".to_string()),
            });
            self.publish(
                &mut inner,
                Snapshot {
                    generation,
                    state: FetchState::Loading,
                    session: Some(key),
                    page: PaginationState::empty(self.limit),
                    notice: None,
                },
            );
            let rollback = InFlight::new(self, generation, FetchState::Loading, cancelled);
            (rollback, request)
        };
        let generation = rollback.generation;

        info!(generation, "starting listing search");
        let result = self.api.listings(&request).await;
        rollback.disarm();

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "discarding stale response");
            return FetchOutcome::Discarded;
        }
        let current = inner.snapshot.clone();

        match result {
            Ok(ListPage { data, total }) => {
                let received = data.len();
                info!(generation, received, total, "listing search loaded");
                self.publish(
                    &mut inner,
                    Snapshot {
                        state: FetchState::Ready,
                        page: PaginationState {
                            offset: 0,
                            limit: self.limit,
                            total,
                            items: data,
                            last_page_size: received as u64,
                        },
                        notice: None,
                        ..(*current).clone()
                    },
                );
                FetchOutcome::Loaded { received, total }
            }
            Err(e) => {
                warn!(generation, "listing search failed: {}", e);
                self.publish(
                    &mut inner,
                    Snapshot {
                        state: FetchState::Error,
                        page: PaginationState::empty(self.limit),
                        notice: Some(e.to_string()),
                        ..(*current).clone()
                    },
                );
                FetchOutcome::Failed(e)
            }
        }
    }

    fn current_sort(&self) -> SortOrder {
        self.snapshot()
            .session
            .as_ref()
            .map(|key| key.sort)
            .unwrap_or_default()
    }
}

impl<A> FetchController<A> {
    fn publish(&self, inner: &mut Inner, snapshot: Snapshot) {
        self.publish_shared(inner, Arc::new(snapshot));
    }

    fn publish_shared(&self, inner: &mut Inner, snapshot: Arc<Snapshot>) {
        inner.snapshot = snapshot.clone();
        self.updates.send_replace(snapshot);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Publishes `fallback` if the request it guards is dropped unfinished
struct InFlight<'a, A> {
    controller: &'a FetchController<A>,
    generation: u64,
    state: FetchState,
    fallback: Option<Arc<Snapshot>>,
}

impl<'a, A> InFlight<'a, A> {
    fn new(
        controller: &'a FetchController<A>,
        generation: u64,
        state: FetchState,
        fallback: Arc<Snapshot>,
    ) -> Self {
        Self {
            controller,
            generation,
            state,
            fallback: Some(fallback),
        }
    }

    /// The request completed; its own transition takes over
    fn disarm(mut self) {
        self.fallback = None;
    }
}

impl<A> Drop for InFlight<'_, A> {
    fn drop(&mut self) {
        let Some(fallback) = self.fallback.take() else {
            return;
        };
        let mut inner = self.controller.lock();
        // Only roll back if nothing newer has replaced the in-flight snapshot.
        if inner.generation == self.generation && inner.snapshot.state == self.state {
            warn!(
                generation = self.generation,
                state = ?self.state,
                "listing request dropped before completing, rolling back"
            );
            self.controller.publish_shared(&mut inner, fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{PriceRange, PropertyType, SectionKind};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    type Reply = Result<ListPage, FetchError>;

    /// Hands out replies in call order; tests decide when each resolves
    #[derive(Default)]
    struct ScriptedApi {
        calls: Mutex<Vec<ListRequest>>,
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    }

    impl ScriptedApi {
        fn expect(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().unwrap().push_back(rx);
            tx
        }

        fn reply_now(&self, reply: Reply) {
            let _ = self.expect().send(reply);
        }

        fn calls(&self) -> Vec<ListRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ListingApi for ScriptedApi {
        async fn listings(&self, request: &ListRequest) -> Result<ListPage, FetchError> {
            self.calls.lock().unwrap().push(request.clone());
            let rx = {
                let mut replies = self.replies.lock().unwrap();
                replies.pop_front().expect("unexpected listings call")
            };
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("reply dropped".to_string())))
        }
    }

    fn page(ids: std::ops::Range<u64>, total: u64) -> Reply {
        let data = ids
            .map(|id| {
                serde_json::from_value(json!({ "id": id, "title": format!("Listing {}", id) }))
                    .unwrap()
            })
            .collect();
        Ok(ListPage { data, total })
    }

    fn ids(snapshot: &Snapshot) -> Vec<u64> {
        snapshot.items().iter().map(|l| l.id).collect()
    }

    fn rent() -> SearchFilter {
        SearchFilter {
            property_type: PropertyType::Rent,
            ..Default::default()
        }
    }

    fn controller(api: &Arc<ScriptedApi>) -> FetchController<ScriptedApi> {
        FetchController::new(api.clone(), ListingScope::All, 9)
    }

    #[tokio::test]
    async fn test_initial_page_reports_more() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));

        let outcome = controller.filter_changed(SearchFilter::default()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Loaded { received: 9, total: 45 }));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, FetchState::Ready);
        assert_eq!(snapshot.page.offset, 0);
        assert_eq!(snapshot.items().len(), 9);
        assert!(snapshot.has_more());
        assert_eq!(api.calls()[0].offset, 0);
        assert_eq!(api.calls()[0].limit, 9);
    }

    #[tokio::test]
    async fn test_load_more_appends_next_page() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();

        api.reply_now(page(9..18, 45));
        let outcome = controller.load_more().await;
        assert!(matches!(outcome, LoadMoreOutcome::Appended { received: 9, .. }));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items().len(), 18);
        assert_eq!(snapshot.page.offset, 9);
        assert!(snapshot.has_more());
        assert_eq!(ids(&snapshot), (0..18).collect::<Vec<_>>());
        assert_eq!(api.calls()[1].offset, 9);
    }

    #[tokio::test]
    async fn test_has_more_is_false_once_total_reached() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 12));
        controller.filter_changed(SearchFilter::default()).await.unwrap();

        api.reply_now(page(9..12, 12));
        controller.load_more().await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items().len(), 12);
        assert!(!snapshot.has_more());

        assert!(matches!(controller.load_more().await, LoadMoreOutcome::Exhausted));
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_items() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();
        let before = controller.snapshot();

        api.reply_now(Err(FetchError::Network("connection reset".to_string())));
        let outcome = controller.load_more().await;
        assert!(matches!(outcome, LoadMoreOutcome::Failed(_)));

        let after = controller.snapshot();
        assert_eq!(after.state, FetchState::Ready);
        assert_eq!(after.page, before.page);
        assert!(after.notice.is_some());

        // The same page is requested again on the next attempt.
        api.reply_now(page(9..18, 45));
        controller.load_more().await;
        assert_eq!(api.calls()[2].offset, 9);
        assert_eq!(controller.snapshot().items().len(), 18);
    }

    #[tokio::test]
    async fn test_failed_initial_load_clears_results() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();

        api.reply_now(Err(FetchError::Api {
            message: "search unavailable".to_string(),
        }));
        let outcome = controller.filter_changed(rent()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Failed(FetchError::Api { .. })));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, FetchState::Error);
        assert!(snapshot.items().is_empty());
        assert_eq!(snapshot.page.total, 0);
        assert!(!snapshot.has_more());
        assert!(matches!(controller.load_more().await, LoadMoreOutcome::NotReady));
    }

    #[tokio::test]
    async fn test_same_filter_is_not_fetched_again() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(rent()).await.unwrap();

        let outcome = controller.filter_changed(rent()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Unchanged));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_same_filter_after_error_is_retried() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(Err(FetchError::Network("timeout".to_string())));
        controller.filter_changed(rent()).await.unwrap();

        api.reply_now(page(0..3, 3));
        let outcome = controller.filter_changed(rent()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Loaded { received: 3, .. }));
    }

    #[tokio::test]
    async fn test_invalid_range_sends_nothing() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        let filter = SearchFilter {
            property_type: PropertyType::Rent,
            price: PriceRange {
                min: Some(1000),
                max: Some(500),
            },
            ..Default::default()
        };

        let result = controller.filter_changed(filter).await;
        assert!(matches!(result, Err(ValidationError::InvalidRange { .. })));
        assert!(api.calls().is_empty());
        assert_eq!(controller.snapshot().state, FetchState::Idle);
    }

    #[tokio::test]
    async fn test_filter_change_replaces_items() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();
        api.reply_now(page(9..18, 45));
        controller.load_more().await;

        api.reply_now(page(100..104, 4));
        controller.filter_changed(rent()).await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(ids(&snapshot), vec![100, 101, 102, 103]);
        assert_eq!(snapshot.page.offset, 0);
        assert_eq!(api.calls()[2].offset, 0);
        assert_eq!(api.calls()[2].filter, rent());
    }

    #[tokio::test]
    async fn test_concurrent_load_more_issues_one_request() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();

        let reply = api.expect();
        let (first, second, third, _) = tokio::join!(
            controller.load_more(),
            controller.load_more(),
            controller.load_more(),
            async {
                tokio::task::yield_now().await;
                let _ = reply.send(page(9..18, 45));
            }
        );

        assert!(matches!(first, LoadMoreOutcome::Appended { .. }));
        assert!(matches!(second, LoadMoreOutcome::InFlight));
        assert!(matches!(third, LoadMoreOutcome::InFlight));
        assert_eq!(api.calls().len(), 2);
        assert_eq!(controller.snapshot().items().len(), 18);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        let reply_a = api.expect();
        let reply_b = api.expect();

        let (a, b, _) = tokio::join!(
            controller.filter_changed(SearchFilter::default()),
            controller.filter_changed(rent()),
            async {
                tokio::task::yield_now().await;
                let _ = reply_b.send(page(200..203, 3));
                tokio::task::yield_now().await;
                let _ = reply_a.send(page(0..9, 45));
            }
        );

        assert!(matches!(a.unwrap(), FetchOutcome::Discarded));
        assert!(matches!(b.unwrap(), FetchOutcome::Loaded { received: 3, .. }));

        let snapshot = controller.snapshot();
        assert_eq!(ids(&snapshot), vec![200, 201, 202]);
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.session.as_ref().unwrap().filter, rent());
    }

    #[tokio::test]
    async fn test_load_more_from_previous_session_is_discarded() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();

        let more = api.expect();
        let fresh = api.expect();
        let (appended, changed, _) = tokio::join!(
            controller.load_more(),
            controller.filter_changed(rent()),
            async {
                tokio::task::yield_now().await;
                let _ = fresh.send(page(300..302, 2));
                tokio::task::yield_now().await;
                let _ = more.send(page(9..18, 45));
            }
        );

        assert!(matches!(appended, LoadMoreOutcome::Discarded));
        assert!(matches!(changed.unwrap(), FetchOutcome::Loaded { .. }));
        assert_eq!(ids(&controller.snapshot()), vec![300, 301]);
    }

    #[tokio::test]
    async fn test_sort_change_starts_new_session() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(rent()).await.unwrap();

        api.reply_now(page(40..45, 45));
        let outcome = controller.sort_changed(SortOrder::PriceHighLow).await;
        assert!(matches!(outcome, FetchOutcome::Loaded { .. }));

        let request = &api.calls()[1];
        assert_eq!(request.sort, SortOrder::PriceHighLow);
        assert_eq!(request.filter, rent());
        assert_eq!(request.offset, 0);
    }

    #[tokio::test]
    async fn test_scope_flags_are_sent() {
        let api = Arc::new(ScriptedApi::default());
        let controller =
            FetchController::new(api.clone(), ListingScope::Section(SectionKind::MostViewed), 12);
        api.reply_now(page(0..12, 40));

        controller.filter_changed(SearchFilter::default()).await.unwrap();
        let request = &api.calls()[0];
        assert!(request.filter.flags.most_viewed);
        assert_eq!(request.limit, 12);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        let mut updates = controller.subscribe();
        api.reply_now(page(0..9, 45));

        controller.filter_changed(SearchFilter::default()).await.unwrap();
        assert!(updates.has_changed().unwrap());
        let latest = updates.borrow_and_update().clone();
        assert_eq!(latest.state, FetchState::Ready);
        assert_eq!(latest.items().len(), 9);
    }

    #[tokio::test]
    async fn test_retry_refetches_current_session() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(rent()).await.unwrap();

        api.reply_now(page(0..9, 46));
        let outcome = controller.retry().await;
        assert!(matches!(outcome, FetchOutcome::Loaded { total: 46, .. }));
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_load_more_can_be_requested_again() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        api.reply_now(page(0..9, 45));
        controller.filter_changed(SearchFilter::default()).await.unwrap();

        let _never = api.expect();
        let abandoned = timeout(Duration::from_millis(10), controller.load_more()).await;
        assert!(abandoned.is_err());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, FetchState::Ready);
        assert_eq!(snapshot.items().len(), 9);

        api.reply_now(page(9..18, 45));
        let outcome = controller.load_more().await;
        assert!(matches!(outcome, LoadMoreOutcome::Appended { received: 9, .. }));
        assert_eq!(api.calls()[2].offset, 9);
        assert_eq!(controller.snapshot().items().len(), 18);
    }

    #[tokio::test]
    async fn test_abandoned_search_can_be_started_again() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);

        let _never = api.expect();
        let abandoned = timeout(Duration::from_millis(10), controller.filter_changed(rent())).await;
        assert!(abandoned.is_err());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, FetchState::Error);
        assert!(snapshot.items().is_empty());
        assert!(snapshot.notice.is_some());

        api.reply_now(page(0..3, 3));
        let outcome = controller.filter_changed(rent()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Loaded { received: 3, .. }));
        assert_eq!(controller.snapshot().state, FetchState::Ready);
    }

    #[tokio::test]
    async fn test_abandoned_stale_search_leaves_newer_session_alone() {
        let api = Arc::new(ScriptedApi::default());
        let controller = controller(&api);
        let _never = api.expect();
        api.reply_now(page(0..3, 3));

        let (stale, fresh) = tokio::join!(
            timeout(Duration::from_millis(10), controller.filter_changed(rent())),
            controller.filter_changed(SearchFilter::default()),
        );
        assert!(stale.is_err());
        assert!(matches!(fresh.unwrap(), FetchOutcome::Loaded { received: 3, .. }));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, FetchState::Ready);
        assert_eq!(ids(&snapshot), vec![0, 1, 2]);
    }
}
