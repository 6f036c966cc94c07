use serde::Serialize;

/// Project header shared by every page
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub owner: String,
    pub name: String,
    pub issues_url: String,
    pub new_issue_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelContext {
    pub id: u64,
    pub category: String,
    pub name: String,
    pub color: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneContext {
    pub id: u64,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssigneeContext {
    pub user_id: u64,
    pub login_id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateContext {
    pub token: String,
    pub label: String,
    pub selected: bool,
}

/// One issue as shown in lists and on the detail page
#[derive(Debug, Clone, Serialize)]
pub struct IssueRowContext {
    pub id: u64,
    pub title: String,
    pub state: String,
    pub state_label: String,
    pub author_login_id: String,
    pub author_name: String,
    pub assignee_login_id: Option<String>,
    pub milestone_title: Option<String>,
    pub labels: Vec<LabelContext>,
    pub num_of_comments: u32,
    pub created_date: String,
    pub url: String,
}

/// The search condition echoed back into the filter form
#[derive(Debug, Clone, Serialize)]
pub struct ConditionContext {
    pub state: String,
    pub filter: String,
    pub author_login_id: String,
    pub assignee_id: Option<u64>,
    pub commented_check: bool,
    pub order_by: String,
    pub order_dir: String,
}

/// Pagination links. `number` is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub number: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueListContext {
    pub title: String,
    pub project: ProjectContext,
    pub condition: ConditionContext,
    pub states: Vec<StateContext>,
    pub issues: Vec<IssueRowContext>,
    pub labels: Vec<LabelContext>,
    pub milestones: Vec<MilestoneContext>,
    pub page: PageContext,
    pub export_url: String,
    pub can_create: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentContext {
    pub id: u64,
    pub body: String,
    pub author_login_id: String,
    pub author_name: String,
    pub created_date: String,
    pub delete_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentContext {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueDetailContext {
    pub title: String,
    pub project: ProjectContext,
    pub issue: IssueRowContext,
    pub body: String,
    pub comments: Vec<CommentContext>,
    pub attachments: Vec<AttachmentContext>,
    pub edit_url: Option<String>,
    pub delete_url: Option<String>,
    pub comment_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorContext {
    pub field: String,
    pub message: String,
}

/// New and edit issue forms
#[derive(Debug, Clone, Serialize)]
pub struct IssueFormContext {
    pub title: String,
    pub project: ProjectContext,
    pub action_url: String,
    pub issue_id: Option<u64>,
    pub form_title: String,
    pub form_body: String,
    /// Empty on the creation form; new issues always start open
    pub states: Vec<StateContext>,
    pub labels: Vec<LabelContext>,
    pub milestones: Vec<MilestoneContext>,
    pub assignees: Vec<AssigneeContext>,
    pub errors: Vec<FieldErrorContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotExistingContext {
    pub title: String,
    pub project: ProjectContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnauthorizedContext {
    pub title: String,
    pub project: ProjectContext,
    pub message: String,
}

/// A page the daemon can render
#[derive(Debug, Clone)]
pub enum View {
    IssueList(IssueListContext),
    IssueDetail(IssueDetailContext),
    NewIssue(IssueFormContext),
    EditIssue(IssueFormContext),
    NotExisting(NotExistingContext),
    Unauthorized(UnauthorizedContext),
}

impl View {
    pub fn template_name(&self) -> &'static str {
        match self {
            View::IssueList(_) => "issue_list",
            View::IssueDetail(_) => "issue",
            View::NewIssue(_) => "new_issue",
            View::EditIssue(_) => "edit_issue",
            View::NotExisting(_) => "not_existing_page",
            View::Unauthorized(_) => "unauthorized",
        }
    }
}
