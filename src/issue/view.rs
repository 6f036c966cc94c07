//! Builds template contexts from store entities.

use super::form::{FormErrors, IssueForm};
use super::routes;
use crate::export::ExportRow;
use crate::model::{Issue, IssueComment, IssueLabel, Milestone, Project, State, User};
use crate::store::{Store, StoreError};
use crate::template::{
    AssigneeContext, CommentContext, FieldErrorContext, IssueFormContext, IssueRowContext,
    LabelContext, MilestoneContext, NotExistingContext, ProjectContext, StateContext,
    UnauthorizedContext,
};
use crate::utils::display_date;
use std::collections::{BTreeSet, HashMap};

pub const LIST_TITLE: &str = "Issues";
pub const NOT_FOUND_TITLE: &str = "Not found";
pub const UNAUTHORIZED_TITLE: &str = "Unauthorized";

pub fn project_context(owner: &str, name: &str) -> ProjectContext {
    ProjectContext {
        owner: owner.to_string(),
        name: name.to_string(),
        issues_url: routes::default_issues_url(owner, name),
        new_issue_url: routes::new_issue_url(owner, name),
    }
}

pub fn not_existing_context(owner: &str, name: &str) -> NotExistingContext {
    NotExistingContext {
        title: NOT_FOUND_TITLE.to_string(),
        project: project_context(owner, name),
    }
}

pub fn unauthorized_context(owner: &str, name: &str, action: &str) -> UnauthorizedContext {
    UnauthorizedContext {
        title: UNAUTHORIZED_TITLE.to_string(),
        project: project_context(owner, name),
        message: format!("You are not allowed to {}.", action),
    }
}

fn state_label(state: State) -> &'static str {
    match state {
        State::Open => "Open",
        State::Closed => "Closed",
    }
}

/// Options of the listing's state selector. Unknown tokens select "all".
pub fn listing_states(selected: &str) -> Vec<StateContext> {
    let selected = State::parse(selected);
    let mut states: Vec<StateContext> = [State::Open, State::Closed]
        .into_iter()
        .map(|state| StateContext {
            token: state.token().to_string(),
            label: state_label(state).to_string(),
            selected: selected == Some(state),
        })
        .collect();
    states.push(StateContext {
        token: "all".to_string(),
        label: "All".to_string(),
        selected: selected.is_none(),
    });
    states
}

fn form_states(selected: Option<&str>) -> Vec<StateContext> {
    let selected = selected.and_then(State::parse).unwrap_or(State::Open);
    [State::Open, State::Closed]
        .into_iter()
        .map(|state| StateContext {
            token: state.token().to_string(),
            label: state_label(state).to_string(),
            selected: selected == state,
        })
        .collect()
}

pub fn label_context(label: &IssueLabel, selected: bool) -> LabelContext {
    LabelContext {
        id: label.id,
        category: label.category.clone(),
        name: label.name.clone(),
        color: label.color.clone(),
        selected,
    }
}

pub fn milestone_context(milestone: &Milestone, selected: bool) -> MilestoneContext {
    MilestoneContext {
        id: milestone.id,
        title: milestone.title.clone(),
        selected,
    }
}

/// Labels, milestones and assignees referenced by a set of issues,
/// loaded once per request so every read reflects the current store.
#[derive(Debug, Default)]
pub struct Lookups {
    labels: HashMap<u64, IssueLabel>,
    milestones: HashMap<u64, Milestone>,
    users: HashMap<u64, User>,
}

impl Lookups {
    pub async fn load(
        store: &dyn Store,
        project: &Project,
        issues: &[Issue],
    ) -> Result<Self, StoreError> {
        let labels = store
            .labels_for_project(project.id)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();
        let milestones = store
            .milestones_for_project(project.id)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let assignee_ids: BTreeSet<u64> = issues
            .iter()
            .filter_map(|i| i.assignee.map(|a| a.user_id))
            .collect();
        let mut users = HashMap::new();
        for id in assignee_ids {
            if let Some(user) = store.find_user(id).await? {
                users.insert(id, user);
            }
        }

        Ok(Self {
            labels,
            milestones,
            users,
        })
    }

    /// Labels attached to `issue` that still exist, ordered by category then name
    pub fn labels_of(&self, issue: &Issue) -> Vec<&IssueLabel> {
        let mut labels: Vec<&IssueLabel> = issue
            .label_ids
            .iter()
            .filter_map(|id| self.labels.get(id))
            .collect();
        labels.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(&b.name)));
        labels
    }

    fn assignee_login(&self, issue: &Issue) -> Option<String> {
        issue
            .assignee
            .and_then(|a| self.users.get(&a.user_id))
            .map(|u| u.login_id.clone())
    }

    fn milestone_title(&self, issue: &Issue) -> Option<String> {
        issue
            .milestone_id
            .and_then(|id| self.milestones.get(&id))
            .map(|m| m.title.clone())
    }

    pub fn row(&self, project: &Project, issue: &Issue) -> IssueRowContext {
        IssueRowContext {
            id: issue.id,
            title: issue.title.clone(),
            state: issue.state.token().to_string(),
            state_label: state_label(issue.state).to_string(),
            author_login_id: issue.author_login_id.clone(),
            author_name: issue.author_name.clone(),
            assignee_login_id: self.assignee_login(issue),
            milestone_title: self.milestone_title(issue),
            labels: self
                .labels_of(issue)
                .into_iter()
                .map(|l| label_context(l, true))
                .collect(),
            num_of_comments: issue.num_of_comments,
            created_date: display_date(&issue.created_date),
            url: routes::issue_url(&project.owner, &project.name, issue.id),
        }
    }

    pub fn export_row(&self, issue: &Issue) -> ExportRow {
        let labels: Vec<String> = self
            .labels_of(issue)
            .into_iter()
            .map(|l| format!("{}: {}", l.category, l.name))
            .collect();
        ExportRow {
            id: issue.id,
            state: issue.state.to_string(),
            title: issue.title.clone(),
            author: issue.author_login_id.clone(),
            assignee: self.assignee_login(issue).unwrap_or_default(),
            milestone: self.milestone_title(issue).unwrap_or_default(),
            labels: labels.join(", "),
            num_of_comments: issue.num_of_comments,
            created_date: display_date(&issue.created_date),
        }
    }
}

pub fn comment_context(
    project: &Project,
    comment: &IssueComment,
    can_delete: bool,
) -> CommentContext {
    CommentContext {
        id: comment.id,
        body: comment.body.clone(),
        author_login_id: comment.author_login_id.clone(),
        author_name: comment.author_name.clone(),
        created_date: display_date(&comment.created_date),
        delete_url: can_delete.then(|| {
            routes::delete_comment_url(&project.owner, &project.name, comment.issue_id, comment.id)
        }),
    }
}

/// Users an issue of `project` can be assigned to: the owner and every member
pub async fn assignable_users(store: &dyn Store, project: &Project) -> Result<Vec<User>, StoreError> {
    let mut users: Vec<User> = Vec::new();
    if let Some(owner) = store.find_user_by_login_id(&project.owner).await? {
        users.push(owner);
    }
    for member in &project.members {
        if users.iter().any(|u| u.id == member.user_id) {
            continue;
        }
        if let Some(user) = store.find_user(member.user_id).await? {
            users.push(user);
        }
    }
    Ok(users)
}

/// Context for the new/edit form. `issue_id` is set when editing.
pub async fn issue_form_context(
    store: &dyn Store,
    project: &Project,
    form: &IssueForm,
    errors: &FormErrors,
    issue_id: Option<u64>,
) -> Result<IssueFormContext, StoreError> {
    let is_selected = |raw: &Option<String>, id: u64| {
        raw.as_deref()
            .is_some_and(|v| v.trim().parse::<u64>().ok() == Some(id))
    };
    let selected_labels: BTreeSet<u64> = form
        .label_ids
        .iter()
        .filter_map(|v| v.trim().parse().ok())
        .collect();

    let labels = store
        .labels_for_project(project.id)
        .await?
        .iter()
        .map(|l| label_context(l, selected_labels.contains(&l.id)))
        .collect();
    let milestones = store
        .milestones_for_project(project.id)
        .await?
        .iter()
        .map(|m| milestone_context(m, is_selected(&form.milestone_id, m.id)))
        .collect();
    let assignees = assignable_users(store, project)
        .await?
        .into_iter()
        .map(|u| AssigneeContext {
            selected: is_selected(&form.assignee_id, u.id),
            user_id: u.id,
            login_id: u.login_id,
            name: u.name,
        })
        .collect();

    let (title, action_url, states) = match issue_id {
        Some(id) => (
            format!("Edit issue #{}", id),
            routes::edit_issue_url(&project.owner, &project.name, id),
            form_states(form.state.as_deref()),
        ),
        None => (
            "New issue".to_string(),
            routes::create_issue_url(&project.owner, &project.name),
            Vec::new(),
        ),
    };

    Ok(IssueFormContext {
        title,
        project: project_context(&project.owner, &project.name),
        action_url,
        issue_id,
        form_title: form.title.clone(),
        form_body: form.body.clone(),
        states,
        labels,
        milestones,
        assignees,
        errors: errors
            .iter()
            .map(|e| FieldErrorContext {
                field: e.field.clone(),
                message: e.message.clone(),
            })
            .collect(),
    })
}
