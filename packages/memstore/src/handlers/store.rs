use chrono::{DateTime, TimeDelta, Utc};
use common::models::{
    BlockedUser, Comment, DeleteMode, EditRequest, Locator, PostInfo, Sign, SortKey,
};
use common::storage::StoreError;
use common::tree::{self, Node};
use serde::Deserialize;

use crate::rpc::Registry;
use crate::state::Stores;

#[derive(Debug, Deserialize)]
pub struct CommentRef {
    pub site: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct FindParams {
    #[serde(flatten)]
    pub locator: Locator,
    #[serde(default)]
    pub sort: SortKey,
}

#[derive(Debug, Deserialize)]
pub struct LastParams {
    pub site: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UserParams {
    pub site: String,
    pub user_id: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub skip: usize,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub site: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub skip: usize,
}

#[derive(Debug, Deserialize)]
pub struct EditParams {
    pub site: String,
    pub id: String,
    #[serde(flatten)]
    pub edit: EditRequest,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub site: String,
    pub id: String,
    #[serde(default)]
    pub mode: DeleteMode,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserParams {
    pub site: String,
    pub user_id: String,
    #[serde(default)]
    pub mode: DeleteMode,
}

#[derive(Debug, Deserialize)]
pub struct VoteParams {
    pub site: String,
    pub id: String,
    pub user_id: String,
    pub sign: Sign,
}

#[derive(Debug, Deserialize)]
pub struct ReadOnlyParams {
    #[serde(flatten)]
    pub locator: Locator,
    pub read_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct SiteUser {
    pub site: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockParams {
    pub site: String,
    pub user_id: String,
    pub blocked: bool,
    /// Block duration in seconds; absent means permanent.
    #[serde(default)]
    pub ttl: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub site: String,
    pub user_id: String,
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct SiteParams {
    pub site: String,
}

pub fn register(registry: &mut Registry) {
    registry
        .register("store.create", create)
        .register("store.get", get)
        .register("store.find", find)
        .register("store.tree", tree)
        .register("store.last", last)
        .register("store.user", user)
        .register("store.user_count", user_count)
        .register("store.count", count)
        .register("store.info", info)
        .register("store.list", list)
        .register("store.edit", edit)
        .register("store.delete", delete)
        .register("store.delete_user", delete_user)
        .register("store.vote", vote)
        .register("store.set_read_only", set_read_only)
        .register("store.is_read_only", is_read_only)
        .register("store.set_blocked", set_blocked)
        .register("store.is_blocked", is_blocked)
        .register("store.blocked", blocked)
        .register("store.set_verified", set_verified)
        .register("store.is_verified", is_verified)
        .register("store.verified", verified);
}

pub async fn create(stores: Stores, comment: Comment) -> Result<String, StoreError> {
    stores.comments.create(comment).await
}

pub async fn get(stores: Stores, p: CommentRef) -> Result<Comment, StoreError> {
    stores.comments.get(&p.site, &p.id).await
}

pub async fn find(stores: Stores, p: FindParams) -> Result<Vec<Comment>, StoreError> {
    stores.comments.find(&p.locator, p.sort).await
}

pub async fn tree(stores: Stores, locator: Locator) -> Result<Vec<Node>, StoreError> {
    let comments = stores.comments.find(&locator, SortKey::TimeAsc).await?;
    Ok(tree::build(comments))
}

pub async fn last(stores: Stores, p: LastParams) -> Result<Vec<Comment>, StoreError> {
    stores.comments.last(&p.site, p.limit, p.since).await
}

pub async fn user(stores: Stores, p: UserParams) -> Result<Vec<Comment>, StoreError> {
    stores
        .comments
        .user_comments(&p.site, &p.user_id, p.limit, p.skip)
        .await
}

pub async fn user_count(stores: Stores, p: SiteUser) -> Result<usize, StoreError> {
    stores.comments.user_count(&p.site, &p.user_id).await
}

pub async fn count(stores: Stores, locator: Locator) -> Result<usize, StoreError> {
    stores.comments.count(&locator).await
}

pub async fn info(stores: Stores, locator: Locator) -> Result<PostInfo, StoreError> {
    stores.comments.info(&locator).await
}

pub async fn list(stores: Stores, p: PageParams) -> Result<Vec<PostInfo>, StoreError> {
    stores.comments.list(&p.site, p.limit, p.skip).await
}

pub async fn edit(stores: Stores, p: EditParams) -> Result<Comment, StoreError> {
    stores.comments.edit(&p.site, &p.id, p.edit).await
}

pub async fn delete(stores: Stores, p: DeleteParams) -> Result<(), StoreError> {
    stores.comments.delete(&p.site, &p.id, p.mode).await
}

pub async fn delete_user(stores: Stores, p: DeleteUserParams) -> Result<usize, StoreError> {
    stores
        .comments
        .delete_user(&p.site, &p.user_id, p.mode)
        .await
}

pub async fn vote(stores: Stores, p: VoteParams) -> Result<i64, StoreError> {
    stores
        .comments
        .vote(&p.site, &p.id, &p.user_id, p.sign)
        .await
}

pub async fn set_read_only(stores: Stores, p: ReadOnlyParams) -> Result<(), StoreError> {
    stores.comments.set_read_only(&p.locator, p.read_only).await
}

pub async fn is_read_only(stores: Stores, locator: Locator) -> Result<bool, StoreError> {
    stores.comments.is_read_only(&locator).await
}

pub async fn set_blocked(stores: Stores, p: BlockParams) -> Result<(), StoreError> {
    let until = match p.ttl {
        Some(secs) => {
            let ttl = i64::try_from(secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .ok_or_else(|| StoreError::Invalid(format!("block ttl {secs}s is out of range")))?;
            Some(Utc::now() + ttl)
        }
        None => None,
    };
    stores
        .comments
        .set_blocked(&p.site, &p.user_id, p.blocked, until)
        .await
}

pub async fn is_blocked(stores: Stores, p: SiteUser) -> Result<bool, StoreError> {
    stores.comments.is_blocked(&p.site, &p.user_id).await
}

pub async fn blocked(stores: Stores, p: SiteParams) -> Result<Vec<BlockedUser>, StoreError> {
    stores.comments.blocked(&p.site).await
}

pub async fn set_verified(stores: Stores, p: VerifyParams) -> Result<(), StoreError> {
    stores
        .comments
        .set_verified(&p.site, &p.user_id, p.verified)
        .await
}

pub async fn is_verified(stores: Stores, p: SiteUser) -> Result<bool, StoreError> {
    stores.comments.is_verified(&p.site, &p.user_id).await
}

pub async fn verified(stores: Stores, p: SiteParams) -> Result<Vec<String>, StoreError> {
    stores.comments.verified(&p.site).await
}
