//! Persistence seam for users, projects and issue postings.
//!
//! Handlers only talk to the [`Store`] trait. [`InMemoryStore`] is the
//! bundled backend; it keeps everything in RAM and can mirror its state to a
//! JSON snapshot file.

mod memory;
pub mod query;

pub use memory::{InMemoryStore, StoreSnapshot};
pub use query::{paginate, Clause, IssueQuery, OrderBy, Page, SortDirection, SortField};

use crate::model::{
    Attachment, AttachmentContainer, Issue, IssueComment, IssueLabel, Milestone, NewComment,
    NewIssue, Project, User,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Issue {0} not found")]
    IssueNotFound(u64),

    #[error("Comment {0} not found")]
    CommentNotFound(u64),
}

#[async_trait]
pub trait Store: Send + Sync {
    // ========== Users & projects ==========

    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError>;

    /// Exact, case-sensitive login id lookup
    async fn find_user_by_login_id(&self, login_id: &str) -> Result<Option<User>, StoreError>;

    /// Users whose login id contains `fragment`, ignoring case
    async fn find_users_by_login_fragment(&self, fragment: &str)
        -> Result<Vec<User>, StoreError>;

    async fn find_project(&self, owner: &str, name: &str) -> Result<Option<Project>, StoreError>;

    async fn find_label(&self, id: u64) -> Result<Option<IssueLabel>, StoreError>;

    async fn labels_for_project(&self, project_id: u64) -> Result<Vec<IssueLabel>, StoreError>;

    async fn find_milestone(&self, id: u64) -> Result<Option<Milestone>, StoreError>;

    async fn milestones_for_project(&self, project_id: u64) -> Result<Vec<Milestone>, StoreError>;

    // ========== Issues ==========

    async fn find_issue(&self, id: u64) -> Result<Option<Issue>, StoreError>;

    /// All issues matching the query, in query order (ascending id when unordered)
    async fn find_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, StoreError>;

    /// One page of the matching issues; `index` is zero-based
    async fn find_issue_page(
        &self,
        query: &IssueQuery,
        index: usize,
        page_size: usize,
    ) -> Result<Page<Issue>, StoreError> {
        let all = self.find_issues(query).await?;
        Ok(paginate(all, index, page_size))
    }

    async fn insert_issue(&self, issue: NewIssue) -> Result<Issue, StoreError>;

    /// Replace a stored issue. The comment count is owned by the store and kept.
    async fn update_issue(&self, issue: Issue) -> Result<Issue, StoreError>;

    /// Remove an issue together with its comments and attachments
    async fn delete_issue(&self, id: u64) -> Result<(), StoreError>;

    // ========== Comments ==========

    async fn find_comment(&self, id: u64) -> Result<Option<IssueComment>, StoreError>;

    /// Comments of an issue, oldest first
    async fn comments_for_issue(&self, issue_id: u64) -> Result<Vec<IssueComment>, StoreError>;

    /// Insert a comment and bump the parent's comment count
    async fn insert_comment(&self, comment: NewComment) -> Result<IssueComment, StoreError>;

    /// Replace the body of a stored comment. Parent and author are kept.
    async fn update_comment(&self, comment: IssueComment) -> Result<IssueComment, StoreError>;

    /// Remove a comment and lower the parent's comment count
    async fn delete_comment(&self, id: u64) -> Result<(), StoreError>;

    // ========== Attachments ==========

    /// Move every pending upload of `user_id` into `container`.
    /// Returns how many files were attached.
    async fn attach_files(
        &self,
        user_id: u64,
        container: AttachmentContainer,
    ) -> Result<usize, StoreError>;

    async fn attachments_for(
        &self,
        container: AttachmentContainer,
    ) -> Result<Vec<Attachment>, StoreError>;
}
