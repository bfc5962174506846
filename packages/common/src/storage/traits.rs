use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreError;
use super::hash::ImageId;
use crate::models::{
    AdminRecord, BlockedUser, Comment, DeleteMode, EditRequest, ImageInfo, Locator, PostInfo,
    Sign, SortKey,
};

/// Comment storage, keyed by site, post URL and comment ID.
///
/// A `limit` of zero means "no limit" wherever it appears.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Store a new comment and return its ID.
    ///
    /// Replaying an identical create returns the ID of the existing record.
    async fn create(&self, comment: Comment) -> Result<String, StoreError>;

    async fn get(&self, site: &str, id: &str) -> Result<Comment, StoreError>;

    /// All comments of a post, tombstones included.
    async fn find(&self, locator: &Locator, sort: SortKey) -> Result<Vec<Comment>, StoreError>;

    /// Most recent live comments across a site, newest first, strictly after `since`.
    async fn last(
        &self,
        site: &str,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Live comments by one author, newest first.
    async fn user_comments(
        &self,
        site: &str,
        user_id: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn user_count(&self, site: &str, user_id: &str) -> Result<usize, StoreError>;

    /// Number of live comments in a post.
    async fn count(&self, locator: &Locator) -> Result<usize, StoreError>;

    async fn info(&self, locator: &Locator) -> Result<PostInfo, StoreError>;

    /// Info for every commented post of a site, most recently active first.
    async fn list(&self, site: &str, limit: usize, skip: usize)
    -> Result<Vec<PostInfo>, StoreError>;

    async fn edit(&self, site: &str, id: &str, edit: EditRequest) -> Result<Comment, StoreError>;

    async fn delete(&self, site: &str, id: &str, mode: DeleteMode) -> Result<(), StoreError>;

    /// Delete every comment of an author, returning how many were affected.
    async fn delete_user(
        &self,
        site: &str,
        user_id: &str,
        mode: DeleteMode,
    ) -> Result<usize, StoreError>;

    /// Record a vote and return the comment's new score.
    async fn vote(&self, site: &str, id: &str, voter: &str, sign: Sign)
    -> Result<i64, StoreError>;

    async fn set_read_only(&self, locator: &Locator, read_only: bool) -> Result<(), StoreError>;

    async fn is_read_only(&self, locator: &Locator) -> Result<bool, StoreError>;

    /// Block (until `until`, or permanently when `None`) or unblock a user.
    async fn set_blocked(
        &self,
        site: &str,
        user_id: &str,
        blocked: bool,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    async fn is_blocked(&self, site: &str, user_id: &str) -> Result<bool, StoreError>;

    /// Currently active blocks.
    async fn blocked(&self, site: &str) -> Result<Vec<BlockedUser>, StoreError>;

    async fn set_verified(
        &self,
        site: &str,
        user_id: &str,
        verified: bool,
    ) -> Result<(), StoreError>;

    async fn is_verified(&self, site: &str, user_id: &str) -> Result<bool, StoreError>;

    async fn verified(&self, site: &str) -> Result<Vec<String>, StoreError>;
}

/// Per-site administrative records.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn set(&self, site: &str, record: AdminRecord) -> Result<(), StoreError>;

    async fn get(&self, site: &str) -> Result<AdminRecord, StoreError>;

    async fn list(&self) -> Result<Vec<AdminRecord>, StoreError>;

    async fn admins(&self, site: &str) -> Result<Vec<String>, StoreError>;

    async fn email(&self, site: &str) -> Result<String, StoreError>;

    async fn enabled(&self, site: &str) -> Result<bool, StoreError>;

    /// Signing secret of a site, falling back to the process-wide one.
    async fn key(&self, site: &str) -> Result<String, StoreError>;
}

/// Content-addressed image blobs with a staged/committed lifecycle.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store bytes in the staged state and return their ID.
    async fn save(&self, data: Vec<u8>) -> Result<ImageId, StoreError>;

    async fn load(&self, id: &ImageId) -> Result<Vec<u8>, StoreError>;

    /// Promote a staged image to committed.
    async fn commit(&self, id: &ImageId) -> Result<(), StoreError>;

    /// Remove staged images staged before `before`, returning how many went.
    async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn info(&self) -> Result<ImageInfo, StoreError>;
}
