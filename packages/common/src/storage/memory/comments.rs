use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::ids;
use crate::models::{
    BlockedUser, Comment, DeleteMode, EditRequest, EditStamp, Locator, PostInfo, Sign, SortKey,
    User,
};
use crate::storage::{CommentStore, StoreError};

/// Default time after creation during which a comment may be edited.
pub const DEFAULT_EDIT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// A block without a TTL lasts this long.
fn permanent_block() -> TimeDelta {
    TimeDelta::days(365 * 100)
}

/// One post's thread, in insertion order.
#[derive(Default)]
struct Post {
    comments: Vec<Comment>,
    positions: HashMap<String, usize>,
    read_only: bool,
}

impl Post {
    fn live(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|c| !c.deleted)
    }

    fn info(&self, url: &str) -> PostInfo {
        PostInfo {
            url: url.to_string(),
            count: self.live().count(),
            first_time: self.comments.iter().map(|c| c.timestamp).min(),
            last_time: self.comments.iter().map(|c| c.timestamp).max(),
            read_only: self.read_only,
        }
    }
}

#[derive(Default)]
struct Site {
    posts: HashMap<String, Post>,
    /// Comment ID to post URL.
    index: HashMap<String, String>,
    blocked: HashMap<String, DateTime<Utc>>,
    verified: HashSet<String>,
}

impl Site {
    fn is_blocked(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.blocked.get(user_id).is_some_and(|until| *until > now)
    }

    fn comment(&self, id: &str) -> Option<&Comment> {
        let post = self.posts.get(self.index.get(id)?)?;
        post.positions.get(id).map(|&pos| &post.comments[pos])
    }

    fn locate_mut(&mut self, id: &str) -> Result<(&mut Post, usize), StoreError> {
        let url = self.index.get(id).ok_or_else(|| comment_not_found(id))?;
        let post = self.posts.get_mut(url).ok_or_else(|| comment_not_found(id))?;
        let pos = *post.positions.get(id).ok_or_else(|| comment_not_found(id))?;
        Ok((post, pos))
    }

    fn all(&self) -> impl Iterator<Item = &Comment> {
        self.posts.values().flat_map(|p| p.comments.iter())
    }

    /// Copy a comment out with the author's current flags applied.
    fn decorate(&self, comment: &Comment, now: DateTime<Utc>) -> Comment {
        let mut out = comment.clone();
        if !out.user.id.is_empty() {
            out.user.blocked = self.is_blocked(&out.user.id, now);
            out.user.verified = self.verified.contains(&out.user.id);
        }
        out
    }
}

fn comment_not_found(id: &str) -> StoreError {
    StoreError::NotFound(format!("comment {id}"))
}

fn require(value: &str, what: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::Invalid(format!("{what} is required")));
    }
    Ok(())
}

fn validate_locator(locator: &Locator) -> Result<(), StoreError> {
    require(&locator.site, "site")?;
    require(&locator.url, "post url")
}

fn chronological(a: &Comment, b: &Comment) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
}

fn sort_comments(comments: &mut [Comment], sort: SortKey) {
    match sort {
        SortKey::TimeAsc => comments.sort_by(chronological),
        SortKey::TimeDesc => comments
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id))),
        SortKey::ScoreAsc => {
            comments.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| chronological(a, b)))
        }
        SortKey::ScoreDesc => {
            comments.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| chronological(a, b)))
        }
        SortKey::Active => {
            comments.sort_by(|a, b| a.deleted.cmp(&b.deleted).then_with(|| chronological(a, b)))
        }
    }
}

fn newest_first(comments: &mut [Comment]) {
    comments.sort_by_cached_key(|c| Reverse(ids::ordering_key(c.timestamp, &c.id)));
}

fn page<T>(items: Vec<T>, limit: usize, skip: usize) -> Vec<T> {
    let rest = items.into_iter().skip(skip);
    if limit == 0 {
        rest.collect()
    } else {
        rest.take(limit).collect()
    }
}

fn tombstone(comment: &mut Comment, mode: DeleteMode) {
    comment.text.clear();
    comment.html.clear();
    comment.deleted = true;
    if mode == DeleteMode::Hard {
        comment.user = User::default();
        comment.score = 0;
        comment.votes.clear();
    }
}

fn is_replay(existing: &Comment, incoming: &Comment) -> bool {
    existing.locator == incoming.locator
        && existing.parent_id == incoming.parent_id
        && existing.user.id == incoming.user.id
        && existing.text == incoming.text
}

/// Comment store held entirely in memory.
pub struct MemoryCommentStore {
    sites: RwLock<HashMap<String, Site>>,
    edit_window: Duration,
}

impl Default for MemoryCommentStore {
    fn default() -> Self {
        Self::new(DEFAULT_EDIT_WINDOW)
    }
}

impl MemoryCommentStore {
    pub fn new(edit_window: Duration) -> Self {
        Self {
            sites: RwLock::new(HashMap::new()),
            edit_window,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Site>>, StoreError> {
        self.sites
            .read()
            .map_err(|_| StoreError::poisoned("comment store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Site>>, StoreError> {
        self.sites
            .write()
            .map_err(|_| StoreError::poisoned("comment store"))
    }

    fn edit_window_expired(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let window = TimeDelta::from_std(self.edit_window).unwrap_or(TimeDelta::MAX);
        now - created > window
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn create(&self, mut comment: Comment) -> Result<String, StoreError> {
        validate_locator(&comment.locator)?;
        require(&comment.user.id, "author id")?;

        if comment.id.is_empty() {
            comment.id = ids::comment_id(
                &comment.locator,
                &comment.parent_id,
                &comment.user.id,
                &comment.text,
                comment.timestamp,
            );
        }

        let now = Utc::now();
        let mut sites = self.write()?;
        let site = sites.entry(comment.locator.site.clone()).or_default();

        if let Some(existing) = site.comment(&comment.id) {
            if is_replay(existing, &comment) {
                debug!(id = %comment.id, "Create replayed, returning existing comment");
                return Ok(comment.id);
            }
            return Err(StoreError::Duplicate(comment.id));
        }

        let url = comment.locator.url.clone();
        if site.posts.get(&url).is_some_and(|p| p.read_only) {
            return Err(StoreError::ReadOnly);
        }
        if site.is_blocked(&comment.user.id, now) {
            return Err(StoreError::Blocked);
        }
        if !comment.parent_id.is_empty()
            && !site
                .posts
                .get(&url)
                .is_some_and(|p| p.positions.contains_key(&comment.parent_id))
        {
            return Err(StoreError::NotFound(format!(
                "parent comment {}",
                comment.parent_id
            )));
        }

        comment.timestamp = now;
        comment.score = 0;
        comment.votes.clear();
        comment.edit = None;
        comment.deleted = false;
        comment.user.blocked = false;
        comment.user.verified = false;

        let id = comment.id.clone();
        let post = site.posts.entry(url.clone()).or_default();
        post.positions.insert(id.clone(), post.comments.len());
        post.comments.push(comment);
        site.index.insert(id.clone(), url);

        Ok(id)
    }

    async fn get(&self, site: &str, id: &str) -> Result<Comment, StoreError> {
        let sites = self.read()?;
        let site = sites.get(site).ok_or_else(|| comment_not_found(id))?;
        let comment = site.comment(id).ok_or_else(|| comment_not_found(id))?;
        Ok(site.decorate(comment, Utc::now()))
    }

    async fn find(&self, locator: &Locator, sort: SortKey) -> Result<Vec<Comment>, StoreError> {
        let sites = self.read()?;
        let Some(site) = sites.get(&locator.site) else {
            return Ok(Vec::new());
        };
        let Some(post) = site.posts.get(&locator.url) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let mut comments: Vec<Comment> = post
            .comments
            .iter()
            .map(|c| site.decorate(c, now))
            .collect();
        sort_comments(&mut comments, sort);
        Ok(comments)
    }

    async fn last(
        &self,
        site: &str,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Comment>, StoreError> {
        let sites = self.read()?;
        let Some(site) = sites.get(site) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let mut comments: Vec<Comment> = site
            .all()
            .filter(|c| !c.deleted && since.is_none_or(|t| c.timestamp > t))
            .map(|c| site.decorate(c, now))
            .collect();
        newest_first(&mut comments);
        Ok(page(comments, limit, 0))
    }

    async fn user_comments(
        &self,
        site: &str,
        user_id: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        require(user_id, "user id")?;
        let sites = self.read()?;
        let Some(site) = sites.get(site) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let mut comments: Vec<Comment> = site
            .all()
            .filter(|c| !c.deleted && c.user.id == user_id)
            .map(|c| site.decorate(c, now))
            .collect();
        newest_first(&mut comments);
        Ok(page(comments, limit, skip))
    }

    async fn user_count(&self, site: &str, user_id: &str) -> Result<usize, StoreError> {
        require(user_id, "user id")?;
        let sites = self.read()?;
        Ok(sites.get(site).map_or(0, |s| {
            s.all().filter(|c| !c.deleted && c.user.id == user_id).count()
        }))
    }

    async fn count(&self, locator: &Locator) -> Result<usize, StoreError> {
        let sites = self.read()?;
        Ok(sites
            .get(&locator.site)
            .and_then(|s| s.posts.get(&locator.url))
            .map_or(0, |p| p.live().count()))
    }

    async fn info(&self, locator: &Locator) -> Result<PostInfo, StoreError> {
        let sites = self.read()?;
        sites
            .get(&locator.site)
            .and_then(|s| s.posts.get(&locator.url))
            .map(|p| p.info(&locator.url))
            .ok_or_else(|| StoreError::NotFound(format!("post {}", locator.url)))
    }

    async fn list(
        &self,
        site: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<PostInfo>, StoreError> {
        let sites = self.read()?;
        let Some(site) = sites.get(site) else {
            return Ok(Vec::new());
        };

        let mut infos: Vec<PostInfo> = site
            .posts
            .iter()
            .filter(|(_, p)| !p.comments.is_empty())
            .map(|(url, p)| p.info(url))
            .collect();
        infos.sort_by(|a, b| b.last_time.cmp(&a.last_time).then_with(|| a.url.cmp(&b.url)));
        Ok(page(infos, limit, skip))
    }

    async fn edit(&self, site: &str, id: &str, edit: EditRequest) -> Result<Comment, StoreError> {
        let now = Utc::now();
        let mut sites = self.write()?;
        let site = sites.get_mut(site).ok_or_else(|| comment_not_found(id))?;
        let (post, pos) = site.locate_mut(id)?;
        let comment = &mut post.comments[pos];

        if comment.deleted {
            return Err(StoreError::Deleted(id.to_string()));
        }
        if self.edit_window_expired(comment.timestamp, now) {
            return Err(StoreError::EditWindowExpired(self.edit_window.as_secs()));
        }

        if let Some(text) = edit.text {
            comment.text = text;
        }
        if let Some(html) = edit.html {
            comment.html = html;
        }
        comment.edit = Some(EditStamp {
            timestamp: now,
            summary: edit.summary.unwrap_or_default(),
        });

        let updated = comment.clone();
        Ok(site.decorate(&updated, now))
    }

    async fn delete(&self, site: &str, id: &str, mode: DeleteMode) -> Result<(), StoreError> {
        let mut sites = self.write()?;
        let site = sites.get_mut(site).ok_or_else(|| comment_not_found(id))?;
        let (post, pos) = site.locate_mut(id)?;
        tombstone(&mut post.comments[pos], mode);
        debug!(id, ?mode, "Comment deleted");
        Ok(())
    }

    async fn delete_user(
        &self,
        site: &str,
        user_id: &str,
        mode: DeleteMode,
    ) -> Result<usize, StoreError> {
        require(user_id, "user id")?;
        let mut sites = self.write()?;
        let Some(site) = sites.get_mut(site) else {
            return Ok(0);
        };

        let mut affected = 0;
        for comment in site.posts.values_mut().flat_map(|p| p.comments.iter_mut()) {
            if comment.user.id == user_id && (!comment.deleted || mode == DeleteMode::Hard) {
                tombstone(comment, mode);
                affected += 1;
            }
        }
        debug!(user_id, affected, ?mode, "User comments deleted");
        Ok(affected)
    }

    async fn vote(
        &self,
        site: &str,
        id: &str,
        voter: &str,
        sign: Sign,
    ) -> Result<i64, StoreError> {
        require(voter, "voter id")?;
        let mut sites = self.write()?;
        let site = sites.get_mut(site).ok_or_else(|| comment_not_found(id))?;
        let (post, pos) = site.locate_mut(id)?;
        if post.read_only {
            return Err(StoreError::ReadOnly);
        }

        let comment = &mut post.comments[pos];
        if comment.deleted {
            return Err(StoreError::Deleted(id.to_string()));
        }
        if comment.user.id == voter {
            return Err(StoreError::SelfVote);
        }

        match comment.votes.insert(voter.to_string(), sign) {
            Some(prev) if prev == sign => {}
            Some(prev) => comment.score += sign.value() - prev.value(),
            None => comment.score += sign.value(),
        }
        Ok(comment.score)
    }

    async fn set_read_only(&self, locator: &Locator, read_only: bool) -> Result<(), StoreError> {
        validate_locator(locator)?;
        let mut sites = self.write()?;
        let site = sites.entry(locator.site.clone()).or_default();
        if read_only {
            site.posts.entry(locator.url.clone()).or_default().read_only = true;
        } else if let Some(post) = site.posts.get_mut(&locator.url) {
            post.read_only = false;
        }
        Ok(())
    }

    async fn is_read_only(&self, locator: &Locator) -> Result<bool, StoreError> {
        let sites = self.read()?;
        Ok(sites
            .get(&locator.site)
            .and_then(|s| s.posts.get(&locator.url))
            .is_some_and(|p| p.read_only))
    }

    async fn set_blocked(
        &self,
        site: &str,
        user_id: &str,
        blocked: bool,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        require(site, "site")?;
        require(user_id, "user id")?;
        let mut sites = self.write()?;
        let site = sites.entry(site.to_string()).or_default();
        if blocked {
            let until = until.unwrap_or_else(|| Utc::now() + permanent_block());
            site.blocked.insert(user_id.to_string(), until);
        } else {
            site.blocked.remove(user_id);
        }
        Ok(())
    }

    async fn is_blocked(&self, site: &str, user_id: &str) -> Result<bool, StoreError> {
        let sites = self.read()?;
        Ok(sites
            .get(site)
            .is_some_and(|s| s.is_blocked(user_id, Utc::now())))
    }

    async fn blocked(&self, site: &str) -> Result<Vec<BlockedUser>, StoreError> {
        let sites = self.read()?;
        let now = Utc::now();
        let mut users: Vec<BlockedUser> = sites
            .get(site)
            .map(|s| {
                s.blocked
                    .iter()
                    .filter(|(_, until)| **until > now)
                    .map(|(user_id, until)| BlockedUser {
                        user_id: user_id.clone(),
                        until: *until,
                    })
                    .collect()
            })
            .unwrap_or_default();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(users)
    }

    async fn set_verified(
        &self,
        site: &str,
        user_id: &str,
        verified: bool,
    ) -> Result<(), StoreError> {
        require(site, "site")?;
        require(user_id, "user id")?;
        let mut sites = self.write()?;
        let site = sites.entry(site.to_string()).or_default();
        if verified {
            site.verified.insert(user_id.to_string());
        } else {
            site.verified.remove(user_id);
        }
        Ok(())
    }

    async fn is_verified(&self, site: &str, user_id: &str) -> Result<bool, StoreError> {
        let sites = self.read()?;
        Ok(sites.get(site).is_some_and(|s| s.verified.contains(user_id)))
    }

    async fn verified(&self, site: &str) -> Result<Vec<String>, StoreError> {
        let sites = self.read()?;
        let mut users: Vec<String> = sites
            .get(site)
            .map(|s| s.verified.iter().cloned().collect())
            .unwrap_or_default();
        users.sort();
        Ok(users)
    }
}
