//! Paginated, cached user list.
//!
//! Pages are fetched one at a time. Each page is first looked up in the cache
//! under `users_page_<n>`; on a miss it is fetched from `GET /users?since=`
//! under the retry policy and written back to the cache.

use crate::analytics::{AnalyticsSink, EventName, ScreenName};
use crate::cache::{users_page_key, CacheService};
use crate::error::NetworkError;
use crate::models::User;
use crate::network::{GitHubService, RetryPolicy};
use crate::state::{StateChange, StateStore};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Published state of a [`UserListController`].
#[derive(Debug, Clone)]
pub struct UserListState {
    /// Every user loaded so far, in page order.
    pub users: Vec<User>,
    /// Index of the next page to load.
    pub current_page: u32,
    /// False once a page came back shorter than the page size.
    pub has_more: bool,
    pub is_loading: bool,
    pub error: Option<NetworkError>,
}

impl Default for UserListState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            current_page: 0,
            has_more: true,
            is_loading: false,
            error: None,
        }
    }
}

/// Field of [`UserListState`] named in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserListField {
    Users,
    CurrentPage,
    HasMore,
    IsLoading,
    Error,
}

pub type UserListChange = StateChange<UserListState, UserListField>;

/// Loads the user list page by page.
pub struct UserListController {
    github: Arc<dyn GitHubService>,
    cache: CacheService,
    analytics: Arc<dyn AnalyticsSink>,
    retry_policy: RetryPolicy,
    page_size: u32,
    store: StateStore<UserListState, UserListField>,
    /// Bumped by `retry`; completions from an older generation are dropped.
    generation: AtomicU64,
}

impl UserListController {
    /// Create an idle controller at page 0. Records the screen view; the
    /// first page is loaded by [`fetch_users`](Self::fetch_users).
    pub fn new(
        github: Arc<dyn GitHubService>,
        cache: CacheService,
        analytics: Arc<dyn AnalyticsSink>,
        retry_policy: RetryPolicy,
        page_size: u32,
    ) -> Self {
        analytics.track_screen_view(ScreenName::USER_LIST);
        info!("User list controller initialized (page size {})", page_size);

        Self {
            github,
            cache,
            analytics,
            retry_policy,
            page_size,
            store: StateStore::new(UserListState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn snapshot(&self) -> UserListState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<UserListChange> {
        self.store.subscribe()
    }

    /// Load the next page.
    ///
    /// Does nothing while another load is in progress. Failures are
    /// published in the state's `error` field rather than returned.
    pub async fn fetch_users(&self) {
        let started = self.store.transaction(|tx| {
            if tx.state().is_loading {
                return None;
            }
            tx.set(UserListField::IsLoading, |s| s.is_loading = true);
            Some((
                self.generation.load(Ordering::SeqCst),
                tx.state().current_page,
            ))
        });

        let Some((generation, page)) = started else {
            debug!("User list fetch already in progress");
            return;
        };

        if let Some(users) = self.cache.retrieve::<Vec<User>>(&users_page_key(page)) {
            self.apply_cached_page(generation, page, users);
            return;
        }

        let since = u64::from(page) * u64::from(self.page_size);
        let github = self.github.as_ref();
        let result = self
            .retry_policy
            .run(|| github.fetch_users(since))
            .await;

        match result {
            Ok(users) => self.apply_fetched_page(generation, page, users),
            Err(e) => self.apply_failure(generation, page, e),
        }
    }

    /// Reset to an empty list and load the first page again.
    ///
    /// A load still in flight from before the reset is discarded when it
    /// completes.
    pub async fn retry(&self) {
        self.store.transaction(|tx| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            tx.set(UserListField::Error, |s| s.error = None);
            tx.set(UserListField::CurrentPage, |s| s.current_page = 0);
            tx.set(UserListField::Users, |s| s.users.clear());
            tx.set(UserListField::HasMore, |s| s.has_more = true);
            if tx.state().is_loading {
                tx.set(UserListField::IsLoading, |s| s.is_loading = false);
            }
        });
        info!("Restarting user list from the first page");

        self.fetch_users().await;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn apply_cached_page(&self, generation: u64, page: u32, users: Vec<User>) {
        let count = users.len();
        let applied = self.store.transaction(|tx| {
            if !self.is_current(generation) {
                return false;
            }
            tx.set(UserListField::Users, |s| s.users.extend(users));
            tx.set(UserListField::CurrentPage, |s| s.current_page += 1);
            tx.set(UserListField::IsLoading, |s| s.is_loading = false);
            true
        });

        if !applied {
            debug!("Discarding stale cached page {}", page);
            return;
        }

        info!("Loaded {} cached users for page {}", count, page);
        self.analytics.track_event(
            EventName::CACHED_USERS_LOADED,
            json!({ "page": page, "user_count": count }),
        );
    }

    fn apply_fetched_page(&self, generation: u64, page: u32, users: Vec<User>) {
        let count = users.len();
        let full_page = count >= self.page_size as usize;
        let applied = self.store.transaction(|tx| {
            if !self.is_current(generation) {
                return false;
            }
            tx.set(UserListField::Users, |s| s.users.extend(users.iter().cloned()));
            tx.set(UserListField::CurrentPage, |s| s.current_page += 1);
            tx.set(UserListField::HasMore, |s| s.has_more = s.has_more && full_page);
            tx.set(UserListField::IsLoading, |s| s.is_loading = false);
            true
        });

        if !applied {
            debug!("Discarding stale response for page {}", page);
            return;
        }

        if let Err(e) = self.cache.cache(&users, &users_page_key(page)) {
            warn!("Failed to cache users page {}: {}", page, e);
        }

        info!("Loaded {} users for page {}", count, page);
        self.analytics.track_event(
            EventName::USER_LIST_LOADED,
            json!({ "page": page, "user_count": count }),
        );
    }

    fn apply_failure(&self, generation: u64, page: u32, err: NetworkError) {
        let applied = self.store.transaction(|tx| {
            if !self.is_current(generation) {
                return false;
            }
            tx.set(UserListField::Error, |s| s.error = Some(err.clone()));
            tx.set(UserListField::IsLoading, |s| s.is_loading = false);
            true
        });

        if !applied {
            debug!("Discarding stale failure for page {}: {}", page, err);
            return;
        }

        error!("Failed to fetch users page {}: {}", page, err);
        self.analytics.track_error(&err);
        self.analytics.track_event(
            EventName::NETWORK_ERROR,
            json!({ "error": err.to_string(), "page": page }),
        );
    }
}
