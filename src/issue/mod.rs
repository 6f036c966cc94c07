mod context;
mod error;
pub mod form;
pub mod handlers;
mod posting;
pub mod routes;
pub mod search;
mod view;

pub use context::RequestContext;
pub use error::IssueAppError;
pub use form::{CommentForm, FieldError, FormData, FormErrors, IssueForm, ValidIssueForm};
pub use handlers::{
    add_comment, create_issue, delete_comment, delete_issue, edit_issue_form, export_issues,
    get_issue, list_issues, new_issue_form, update_issue, Reply,
};
pub use posting::{delete_posting, edit_posting, new_comment, Posting};
pub use search::{SearchCondition, DEFAULT_STATE, ITEMS_PER_PAGE};
pub use view::{not_existing_context, unauthorized_context};
