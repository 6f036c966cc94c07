//! Entities the issue tracker stores and renders.

mod attachment;
mod comment;
mod issue;
mod project;
mod user;

pub use attachment::{Attachment, AttachmentContainer};
pub use comment::{IssueComment, NewComment};
pub use issue::{Assignee, Issue, IssueLabel, NewIssue, State};
pub use project::{Milestone, Project, ProjectMember, ProjectRole};
pub use user::User;
