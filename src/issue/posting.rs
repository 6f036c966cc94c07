//! Edit and delete routines shared by every kind of posting.
//!
//! Issues and comments go through the same sequence: authorize against the
//! stored original, carry over the fields a form never rebinds, give the
//! caller a last look via a pre-save hook, then persist.

use super::context::RequestContext;
use super::error::IssueAppError;
use crate::access::{can_create, can_perform, Operation, Resource, ResourceType};
use crate::model::{AttachmentContainer, Issue, IssueComment, NewComment, Project};
use crate::store::{Store, StoreError};
use async_trait::async_trait;
use tracing::info;

/// Something a user authors inside a project
#[async_trait]
pub trait Posting: Clone + Send + Sync + Sized + 'static {
    fn id(&self) -> u64;

    fn as_resource<'a>(&'a self, project: &'a Project) -> Resource<'a>;

    /// Copy identity and bookkeeping fields from the stored original
    fn preserve_from(&mut self, original: &Self);

    async fn save(self, store: &dyn Store) -> Result<Self, StoreError>;

    async fn remove(&self, store: &dyn Store) -> Result<(), StoreError>;
}

#[async_trait]
impl Posting for Issue {
    fn id(&self) -> u64 {
        self.id
    }

    fn as_resource<'a>(&'a self, project: &'a Project) -> Resource<'a> {
        Resource::Issue {
            project,
            issue: self,
        }
    }

    fn preserve_from(&mut self, original: &Self) {
        self.id = original.id;
        self.created_date = original.created_date;
        self.author_id = original.author_id;
        self.author_login_id = original.author_login_id.clone();
        self.author_name = original.author_name.clone();
        self.num_of_comments = original.num_of_comments;
    }

    async fn save(self, store: &dyn Store) -> Result<Self, StoreError> {
        store.update_issue(self).await
    }

    async fn remove(&self, store: &dyn Store) -> Result<(), StoreError> {
        store.delete_issue(self.id).await
    }
}

#[async_trait]
impl Posting for IssueComment {
    fn id(&self) -> u64 {
        self.id
    }

    fn as_resource<'a>(&'a self, project: &'a Project) -> Resource<'a> {
        Resource::Comment {
            project,
            comment: self,
        }
    }

    fn preserve_from(&mut self, original: &Self) {
        self.id = original.id;
        self.issue_id = original.issue_id;
        self.created_date = original.created_date;
        self.author_id = original.author_id;
        self.author_login_id = original.author_login_id.clone();
        self.author_name = original.author_name.clone();
    }

    async fn save(self, store: &dyn Store) -> Result<Self, StoreError> {
        store.update_comment(self).await
    }

    async fn remove(&self, store: &dyn Store) -> Result<(), StoreError> {
        store.delete_comment(self.id).await
    }
}

/// Persist `updated` in place of `original`.
///
/// Fails with `Unauthorized` (nothing written) unless the acting user may
/// update `original`. `pre_save` runs after the preserved fields are copied.
pub async fn edit_posting<P, F>(
    store: &dyn Store,
    ctx: &RequestContext,
    project: &Project,
    original: &P,
    mut updated: P,
    pre_save: F,
) -> Result<P, IssueAppError>
where
    P: Posting,
    F: FnOnce(P) -> P + Send,
{
    if !can_perform(&ctx.user, &original.as_resource(project), Operation::Update) {
        return Err(IssueAppError::unauthorized(
            project,
            format!("{} posting {}", Operation::Update, original.id()),
        ));
    }

    updated.preserve_from(original);
    let saved = pre_save(updated).save(store).await?;

    info!(
        request_id = %ctx.request_id,
        user = %ctx.user.login_id,
        posting = saved.id(),
        "Posting updated"
    );
    Ok(saved)
}

/// Remove `posting` if the acting user may delete it
pub async fn delete_posting<P: Posting>(
    store: &dyn Store,
    ctx: &RequestContext,
    project: &Project,
    posting: &P,
) -> Result<(), IssueAppError> {
    if !can_perform(&ctx.user, &posting.as_resource(project), Operation::Delete) {
        return Err(IssueAppError::unauthorized(
            project,
            format!("{} posting {}", Operation::Delete, posting.id()),
        ));
    }

    posting.remove(store).await?;

    info!(
        request_id = %ctx.request_id,
        user = %ctx.user.login_id,
        posting = posting.id(),
        "Posting deleted"
    );
    Ok(())
}

/// Store a new comment by the acting user and move their pending uploads onto it
pub async fn new_comment<F>(
    store: &dyn Store,
    ctx: &RequestContext,
    project: &Project,
    body: String,
    pre_save: F,
) -> Result<IssueComment, IssueAppError>
where
    F: FnOnce(NewComment) -> NewComment + Send,
{
    if !can_create(&ctx.user, project, ResourceType::IssueComment) {
        return Err(IssueAppError::unauthorized(
            project,
            format!("create an {}", ResourceType::IssueComment),
        ));
    }

    let comment = NewComment {
        issue_id: 0,
        body,
        author_id: ctx.user.id,
        author_login_id: ctx.user.login_id.clone(),
        author_name: ctx.user.name.clone(),
        created_date: crate::utils::now(),
    };
    let saved = store.insert_comment(pre_save(comment)).await?;
    let attached = store
        .attach_files(ctx.user.id, AttachmentContainer::Comment(saved.id))
        .await?;

    info!(
        request_id = %ctx.request_id,
        user = %ctx.user.login_id,
        issue_id = saved.issue_id,
        comment_id = saved.id,
        attached,
        "Comment added"
    );
    Ok(saved)
}
