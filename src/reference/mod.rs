//! Category and facility lists shared by every filter UI.
//!
//! Lists are cached per `(locale, kind)` and only ever grow: "load more"
//! appends the next page and never refetches one already held. Concurrent
//! loads of the same list share one in-flight request. Changing the locale
//! drops everything, because item names are translated server-side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::api::{ReferenceApi, ReferenceItem, ReferenceKind, ReferencePage, ReferenceRequest};
use crate::error::ReferenceLoadError;

/// A reference list as held in the cache
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceList {
    pub kind: ReferenceKind,
    pub locale: String,
    pub items: Vec<ReferenceItem>,
    /// Server-reported size, when the endpoint sends one
    pub total: Option<u64>,
    pub has_more: bool,
}

impl ReferenceList {
    fn next_offset(&self) -> u64 {
        self.items.len() as u64
    }
}

/// What a dropdown should show for one list
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceStatus {
    NotLoaded,
    Loading,
    Loaded(Arc<ReferenceList>),
    Failed(ReferenceLoadError),
}

type LoadResult = Result<Arc<ReferenceList>, ReferenceLoadError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

#[derive(Default)]
struct Entry {
    list: Option<Arc<ReferenceList>>,
    pending: Option<SharedLoad>,
    failure: Option<ReferenceLoadError>,
}

struct Inner {
    locale: String,
    /// Bumped on every locale change so late pages from the old locale are dropped
    epoch: u64,
    entries: HashMap<(String, ReferenceKind), Entry>,
}

pub struct ReferenceCache<R> {
    api: Arc<R>,
    limit: u64,
    inner: Arc<Mutex<Inner>>,
}

impl<R: ReferenceApi + 'static> ReferenceCache<R> {
    pub fn new(api: Arc<R>, locale: impl Into<String>, limit: u64) -> Self {
        Self {
            api,
            limit,
            inner: Arc::new(Mutex::new(Inner {
                locale: locale.into(),
                epoch: 0,
                entries: HashMap::new(),
            })),
        }
    }

    pub fn locale(&self) -> String {
        lock(&self.inner).locale.clone()
    }

    /// Cached list for the current locale, if loaded
    pub fn get(&self, kind: ReferenceKind) -> Option<Arc<ReferenceList>> {
        let inner = lock(&self.inner);
        inner
            .entries
            .get(&(inner.locale.clone(), kind))
            .and_then(|entry| entry.list.clone())
    }

    pub fn status(&self, kind: ReferenceKind) -> ReferenceStatus {
        let inner = lock(&self.inner);
        match inner.entries.get(&(inner.locale.clone(), kind)) {
            None => ReferenceStatus::NotLoaded,
            Some(entry) if entry.pending.is_some() => ReferenceStatus::Loading,
            Some(Entry {
                list: Some(list), ..
            }) => ReferenceStatus::Loaded(list.clone()),
            Some(Entry {
                failure: Some(e), ..
            }) => ReferenceStatus::Failed(e.clone()),
            Some(_) => ReferenceStatus::NotLoaded,
        }
    }

    /// Loads the first page of `kind` unless it is already held for `locale`.
    ///
    /// A different locale than the current one switches the cache to it first.
    pub async fn ensure_loaded(&self, kind: ReferenceKind, locale: &str) -> LoadResult {
        if self.locale() != locale {
            self.invalidate(locale);
        }

        let load = {
            let mut inner = lock(&self.inner);
            let key = (inner.locale.clone(), kind);
            let epoch = inner.epoch;
            let entry = inner.entries.entry(key.clone()).or_default();

            if let Some(list) = &entry.list {
                return Ok(list.clone());
            }
            if let Some(pending) = &entry.pending {
                debug!(%kind, locale = %key.0, "joining in-flight reference load");
                pending.clone()
            } else {
                let load = self.page_load(key, epoch, None);
                entry.pending = Some(load.clone());
                entry.failure = None;
                load
            }
        };

        load.await
    }

    /// Appends the next page of `kind` for the current locale.
    ///
    /// Returns the list unchanged when nothing more is available, and joins
    /// any load of the same list that is already in flight.
    pub async fn load_more(&self, kind: ReferenceKind) -> LoadResult {
        let load = {
            let mut inner = lock(&self.inner);
            let key = (inner.locale.clone(), kind);
            let epoch = inner.epoch;
            let Some(entry) = inner.entries.get_mut(&key) else {
                return Err(ReferenceLoadError::NotLoaded {
                    kind: kind.to_string(),
                });
            };

            if let Some(pending) = &entry.pending {
                pending.clone()
            } else {
                let Some(list) = entry.list.clone() else {
                    return Err(ReferenceLoadError::NotLoaded {
                        kind: kind.to_string(),
                    });
                };
                if !list.has_more {
                    return Ok(list);
                }
                let load = self.page_load(key, epoch, Some(list));
                entry.pending = Some(load.clone());
                load
            }
        };

        load.await
    }

    /// Switches locale, reloading the first page of every list that was loaded
    pub async fn set_locale(&self, locale: &str) -> Vec<LoadResult> {
        if self.locale() == locale {
            return Vec::new();
        }
        let kinds = self.invalidate(locale);
        join_all(kinds.into_iter().map(|kind| self.ensure_loaded(kind, locale))).await
    }

    /// Drops every cached list and returns the kinds that had been requested
    fn invalidate(&self, locale: &str) -> Vec<ReferenceKind> {
        let mut inner = lock(&self.inner);
        if inner.locale == locale {
            return Vec::new();
        }
        info!(from = %inner.locale, to = locale, "locale changed, dropping reference lists");

        let mut kinds: Vec<ReferenceKind> = inner.entries.keys().map(|(_, kind)| *kind).collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds.dedup();

        inner.entries.clear();
        inner.epoch += 1;
        inner.locale = locale.to_string();
        kinds
    }

    /// Future fetching the page after `previous` (or the first page) and
    /// storing the grown list. Runs once however many callers await it.
    fn page_load(
        &self,
        key: (String, ReferenceKind),
        epoch: u64,
        previous: Option<Arc<ReferenceList>>,
    ) -> SharedLoad {
        let api = self.api.clone();
        let state = self.inner.clone();
        let limit = self.limit;
        let (locale, kind) = key.clone();
        let request = ReferenceRequest {
            kind,
            locale: locale.clone(),
            offset: previous.as_ref().map_or(0, |list| list.next_offset()),
            limit,
        };

        async move {
            debug!(%kind, %locale, offset = request.offset, "fetching reference page");
            let result = api.reference_list(&request).await;

            let mut inner = lock(&state);
            if inner.epoch != epoch {
                debug!(%kind, %locale, "dropping reference page from previous locale");
                return Err(ReferenceLoadError::Invalidated {
                    kind: kind.to_string(),
                });
            }
            let entry = inner.entries.entry(key).or_default();
            entry.pending = None;

            match result {
                Ok(page) => {
                    let list = Arc::new(grow(previous.as_deref(), page, kind, &locale, limit));
                    info!(
                        %kind,
                        %locale,
                        items = list.items.len(),
                        has_more = list.has_more,
                        "reference list updated"
                    );
                    entry.list = Some(list.clone());
                    entry.failure = None;
                    Ok(list)
                }
                Err(e) => {
                    warn!(%kind, %locale, "reference load failed: {}", e);
                    let error = ReferenceLoadError::Fetch {
                        kind: kind.to_string(),
                        locale: locale.clone(),
                        message: e.to_string(),
                    };
                    entry.failure = Some(error.clone());
                    Err(error)
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn grow(
    previous: Option<&ReferenceList>,
    page: ReferencePage,
    kind: ReferenceKind,
    locale: &str,
    limit: u64,
) -> ReferenceList {
    let received = page.data.len() as u64;
    let mut items = previous.map(|list| list.items.clone()).unwrap_or_default();
    items.extend(page.data);

    let total = page.total.or_else(|| previous.and_then(|list| list.total));
    let has_more = match total {
        Some(total) => (items.len() as u64) < total && received > 0,
        None => received == limit,
    };

    ReferenceList {
        kind,
        locale: locale.to_string(),
        items,
        total,
        has_more,
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
