use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a single post (page) within a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub site: String,
    pub url: String,
}

impl Locator {
    pub fn new(site: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            url: url.into(),
        }
    }
}

/// Comment author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Direction of a single vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Sign {
    Up,
    Down,
}

impl Sign {
    pub fn value(self) -> i64 {
        match self {
            Sign::Up => 1,
            Sign::Down => -1,
        }
    }
}

impl TryFrom<i8> for Sign {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Sign::Up),
            -1 => Ok(Sign::Down),
            other => Err(format!("vote sign must be 1 or -1, got {other}")),
        }
    }
}

impl From<Sign> for i8 {
    fn from(sign: Sign) -> Self {
        match sign {
            Sign::Up => 1,
            Sign::Down => -1,
        }
    }
}

/// Edit stamp recorded on a comment after a successful edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditStamp {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Assigned by the store on create unless supplied by the caller.
    #[serde(default)]
    pub id: String,
    pub locator: Locator,
    #[serde(default)]
    pub parent_id: String,
    pub user: User,
    /// Body as submitted.
    #[serde(default)]
    pub text: String,
    /// Rendered body.
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub votes: BTreeMap<String, Sign>,
    /// Creation time. On create, the submitted value only feeds ID derivation
    /// and is replaced with the store's clock.
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditStamp>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub pin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Fields a caller may change through an edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Clear the body, keep author, score and votes.
    #[default]
    Soft,
    /// Clear the body and author identity, zero the score, drop votes.
    Hard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "+time")]
    TimeAsc,
    #[serde(rename = "-time")]
    TimeDesc,
    #[serde(rename = "+score")]
    ScoreAsc,
    #[serde(rename = "-score")]
    ScoreDesc,
    #[serde(rename = "+active")]
    Active,
}

/// Summary of a single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInfo {
    pub url: String,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedUser {
    pub user_id: String,
    pub until: DateTime<Utc>,
}

/// Per-site administrative record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub admins: BTreeSet<String>,
    #[serde(default)]
    pub email: String,
    /// Accepted on input, never written out. Read it through the key lookup.
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
}

/// Snapshot of the image store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub staged: usize,
    pub committed: usize,
    pub bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_staged: Option<DateTime<Utc>>,
}
