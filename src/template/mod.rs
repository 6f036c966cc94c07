mod engine;
mod types;

pub use engine::{TemplateEngine, TemplateError};
pub use types::{
    AssigneeContext, AttachmentContext, CommentContext, ConditionContext, FieldErrorContext,
    IssueDetailContext, IssueFormContext, IssueListContext, IssueRowContext, LabelContext,
    MilestoneContext, NotExistingContext, PageContext, ProjectContext, StateContext,
    UnauthorizedContext, View,
};
