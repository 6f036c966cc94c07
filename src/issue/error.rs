use super::form::FormErrors;
use crate::export::ExportError;
use crate::model::Project;
use crate::store::StoreError;
use crate::template::View;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IssueAppError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),

    #[error("Project {owner}/{name} not found")]
    ProjectNotFound { owner: String, name: String },

    #[error("Not allowed to {action} in {owner}/{name}")]
    Unauthorized {
        owner: String,
        name: String,
        action: String,
    },

    #[error("Issue {id} not found in {owner}/{name}")]
    IssueNotFound { owner: String, name: String, id: u64 },

    #[error("Comment {id} not found in {owner}/{name}")]
    CommentNotFound { owner: String, name: String, id: u64 },

    /// The submitted form, re-rendered with its errors
    #[error("Invalid issue: {errors}")]
    InvalidIssue { errors: FormErrors, view: Box<View> },

    #[error("Invalid comment: {0}")]
    InvalidComment(FormErrors),
}

impl IssueAppError {
    pub fn unauthorized(project: &Project, action: impl Into<String>) -> Self {
        IssueAppError::Unauthorized {
            owner: project.owner.clone(),
            name: project.name.clone(),
            action: action.into(),
        }
    }

    pub fn issue_not_found(project: &Project, id: u64) -> Self {
        IssueAppError::IssueNotFound {
            owner: project.owner.clone(),
            name: project.name.clone(),
            id,
        }
    }

    pub fn comment_not_found(project: &Project, id: u64) -> Self {
        IssueAppError::CommentNotFound {
            owner: project.owner.clone(),
            name: project.name.clone(),
            id,
        }
    }
}
