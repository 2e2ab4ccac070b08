use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::error::ReviewError;
use crate::listings::RatingSummary;
use crate::reviews::tree::find_review_by_author;
use crate::reviews::{ParentType, ReplyInput, ReviewApi, ReviewForest, ReviewInput};
use crate::session::Session;

/// Lifecycle of a review thread within one listing view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Constructed, nothing fetched yet
    Idle,
    /// Initial or explicit tree load in flight
    Loading,
    /// Snapshot reflects the last completed fetch
    Loaded,
    /// A user action is in flight
    Mutating,
    /// Last action failed; old snapshot kept, message available
    LoadedWithError,
}

struct Inner {
    state: ThreadState,
    snapshot: Arc<ReviewForest>,
    error: Option<String>,
}

/// In-memory review forest of one listing, synchronized with the server
///
/// The server owns the tree. After every successful mutation the whole
/// forest is fetched again and the snapshot replaced; nodes are never
/// patched locally. The store lives as long as the listing view and is
/// torn down with [`ReviewThreadStore::unmount`].
pub struct ReviewThreadStore {
    api: Arc<dyn ReviewApi>,
    session: Session,
    post_id: i64,
    inner: RwLock<Inner>,
    mounted: CancellationToken,
}

impl ReviewThreadStore {
    pub fn new(api: Arc<dyn ReviewApi>, session: Session, post_id: i64) -> Self {
        Self {
            api,
            session,
            post_id,
            inner: RwLock::new(Inner {
                state: ThreadState::Idle,
                snapshot: Arc::new(ReviewForest::empty()),
                error: None,
            }),
            mounted: CancellationToken::new(),
        }
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current forest snapshot (cheap Arc clone)
    pub fn snapshot(&self) -> Arc<ReviewForest> {
        self.read().snapshot.clone()
    }

    pub fn state(&self) -> ThreadState {
        self.read().state
    }

    /// Message of the last failed action, if not cleared since
    pub fn last_error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Dismiss the current error message
    pub fn clear_error(&self) {
        let mut inner = self.write();
        inner.error = None;
        if inner.state == ThreadState::LoadedWithError {
            inner.state = ThreadState::Loaded;
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_cancelled()
    }

    /// Tear down the view: in-flight loads are discarded and no further
    /// re-fetch is applied to the snapshot
    pub fn unmount(&self) {
        tracing::debug!("Unmounting review thread for post {}", self.post_id);
        self.mounted.cancel();
    }

    /// Fetch the full forest and replace the snapshot
    ///
    /// Fail-soft: a failed or undecodable fetch leaves an empty forest and a
    /// log line, never an error. A load canceled by unmount changes nothing.
    /// A non-positive post id cannot name a listing, so nothing is fetched.
    pub async fn load_tree(&self) {
        if !self.is_mounted() {
            return;
        }
        if self.post_id <= 0 {
            tracing::warn!("Not loading reviews for invalid post id {}", self.post_id);
            let mut inner = self.write();
            inner.snapshot = Arc::new(ReviewForest::empty());
            inner.state = ThreadState::Loaded;
            return;
        }
        let before = {
            let mut inner = self.write();
            std::mem::replace(&mut inner.state, ThreadState::Loading)
        };
        self.refetch(before).await;
    }

    /// Average rating and review count from the listing detail endpoint
    pub async fn load_summary(&self) -> Result<RatingSummary, ReviewError> {
        self.check_post_id()?;
        let post = self.api.fetch_post(self.post_id).await?;
        Ok(post.rating_summary())
    }

    /// Create the active user's review, or update it if the snapshot
    /// already holds one by the same user
    pub async fn submit_review(&self, rating: i64, content: &str) -> Result<(), ReviewError> {
        let input = ReviewInput::new(rating, content);
        if let Err(errors) = input.validate() {
            return Err(self.fail(errors.into(), None));
        }
        if let Err(err) = self.check_post_id() {
            return Err(self.fail(err, None));
        }
        let token = self.authorize()?;

        let existing = self
            .session
            .user_id
            .and_then(|uid| find_review_by_author(&self.snapshot(), uid).map(|r| r.id));

        let before = self.begin_mutation();
        let result = match existing {
            Some(review_id) => {
                tracing::debug!("User already reviewed post {}, updating review {}", self.post_id, review_id);
                self.api.update_review(&token, review_id, &input).await
            }
            None => self.api.create_review(&token, self.post_id, &input).await,
        };
        self.complete("submit review", before, result).await
    }

    /// Reply to a review or to another reply
    pub async fn submit_reply(
        &self,
        parent_type: ParentType,
        parent_id: i64,
        content: &str,
    ) -> Result<(), ReviewError> {
        let input = ReplyInput::new(content);
        if let Err(errors) = input.validate() {
            return Err(self.fail(errors.into(), None));
        }
        let token = self.authorize()?;

        let before = self.begin_mutation();
        let result = self
            .api
            .create_reply(&token, parent_type, parent_id, &input)
            .await;
        self.complete("submit reply", before, result).await
    }

    /// Change rating and content of an existing review
    ///
    /// Authorship is left to the server.
    pub async fn edit_review(&self, review_id: i64, input: ReviewInput) -> Result<(), ReviewError> {
        if let Err(errors) = input.validate() {
            return Err(self.fail(errors.into(), None));
        }
        let token = self.authorize()?;

        let before = self.begin_mutation();
        let result = self.api.update_review(&token, review_id, &input).await;
        self.complete("edit review", before, result).await
    }

    /// Delete a review; the server removes its replies with it
    pub async fn delete_review(&self, review_id: i64) -> Result<(), ReviewError> {
        let token = self.authorize()?;

        let before = self.begin_mutation();
        let result = self.api.delete_review(&token, review_id).await;
        self.complete("delete review", before, result).await
    }

    fn check_post_id(&self) -> Result<(), ReviewError> {
        if self.post_id <= 0 {
            return Err(ReviewError::Validation(format!(
                "Invalid listing id {}",
                self.post_id
            )));
        }
        Ok(())
    }

    fn authorize(&self) -> Result<String, ReviewError> {
        match self.session.bearer_token() {
            Some(token) => Ok(token.to_string()),
            None => Err(self.fail(ReviewError::AuthRequired, None)),
        }
    }

    /// Enter `Mutating` and return the state to fall back to if the view
    /// goes away before the action settles
    fn begin_mutation(&self) -> ThreadState {
        let mut inner = self.write();
        let before = inner.state;
        if self.is_mounted() {
            inner.state = ThreadState::Mutating;
        }
        before
    }

    /// Record a failed action; the snapshot is left untouched
    ///
    /// Once unmounted nothing is recorded and the state falls back to
    /// `before`, if given.
    fn fail(&self, err: ReviewError, before: Option<ThreadState>) -> ReviewError {
        tracing::debug!("Review action on post {} failed: {}", self.post_id, err);
        let mut inner = self.write();
        if self.mounted.is_cancelled() {
            if let Some(before) = before {
                inner.state = before;
            }
            return err;
        }
        inner.state = ThreadState::LoadedWithError;
        inner.error = Some(err.user_message());
        err
    }

    async fn complete(
        &self,
        action: &str,
        before: ThreadState,
        result: Result<(), ReviewError>,
    ) -> Result<(), ReviewError> {
        match result {
            Ok(()) => {
                tracing::info!("{} succeeded for post {}", action, self.post_id);
                {
                    let mut inner = self.write();
                    if self.is_mounted() {
                        inner.error = None;
                    }
                }
                self.refetch(before).await;
                Ok(())
            }
            Err(err) => Err(self.fail(err, Some(before))),
        }
    }

    /// Fetch the forest unless unmounted, then swap the snapshot
    ///
    /// A fetch discarded by unmount puts the state back to `before`.
    async fn refetch(&self, before: ThreadState) {
        let fetched = tokio::select! {
            biased;
            _ = self.mounted.cancelled() => None,
            result = self.api.fetch_tree(self.post_id) => Some(result),
        };

        let mut inner = self.write();
        // Checked under the lock so unmount cannot slip in before the swap
        if self.mounted.is_cancelled() {
            tracing::debug!("Discarding review tree for unmounted post {}", self.post_id);
            inner.state = before;
            return;
        }

        let forest = match fetched {
            Some(Ok(forest)) => forest,
            Some(Err(err)) => {
                tracing::warn!("Failed to load review tree for post {}: {}", self.post_id, err);
                ReviewForest::empty()
            }
            None => return,
        };

        inner.snapshot = Arc::new(forest);
        inner.state = if inner.error.is_some() {
            ThreadState::LoadedWithError
        } else {
            ThreadState::Loaded
        };
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
