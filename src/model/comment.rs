use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub id: u64,
    pub issue_id: u64,
    pub body: String,
    pub author_id: u64,
    pub author_login_id: String,
    pub author_name: String,
    pub created_date: DateTime<Utc>,
}

/// Data for inserting a comment; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewComment {
    pub issue_id: u64,
    pub body: String,
    pub author_id: u64,
    pub author_login_id: String,
    pub author_name: String,
    pub created_date: DateTime<Utc>,
}

impl NewComment {
    pub fn into_comment(self, id: u64) -> IssueComment {
        IssueComment {
            id,
            issue_id: self.issue_id,
            body: self.body,
            author_id: self.author_id,
            author_login_id: self.author_login_id,
            author_name: self.author_name,
            created_date: self.created_date,
        }
    }
}
