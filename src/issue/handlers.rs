//! Issue and comment operations, independent of HTTP.
//!
//! Every handler takes the store, the request context and the project path
//! it was addressed through, and answers with a [`Reply`] describing what to
//! send back. Failures are [`IssueAppError`]s; the server maps them to
//! status codes.

use super::context::RequestContext;
use super::error::IssueAppError;
use super::form::{CommentForm, FormErrors, IssueForm, ValidIssueForm};
use super::posting::{delete_posting, edit_posting, new_comment};
use super::routes;
use super::search::{SearchCondition, ITEMS_PER_PAGE};
use super::view::{self, Lookups};
use crate::access::{can_create, can_perform, Operation, Resource, ResourceType};
use crate::export::{excel_save, ExportFile};
use crate::model::{Assignee, AttachmentContainer, Issue, NewIssue, Project, State};
use crate::store::{Store, StoreError};
use crate::template::{
    AttachmentContext, ConditionContext, IssueDetailContext, IssueListContext, PageContext, View,
};
use tracing::{debug, info};

/// What a handler wants sent back to the client
#[derive(Debug)]
pub enum Reply {
    Render(View),
    /// See-other redirect to a local URL
    Redirect(String),
    Download(ExportFile),
}

async fn load_project(store: &dyn Store, owner: &str, name: &str) -> Result<Project, IssueAppError> {
    store
        .find_project(owner, name)
        .await?
        .ok_or_else(|| IssueAppError::ProjectNotFound {
            owner: owner.to_string(),
            name: name.to_string(),
        })
}

/// The issue with `id`, if it exists and belongs to `project`
async fn find_project_issue(
    store: &dyn Store,
    project: &Project,
    id: u64,
) -> Result<Option<Issue>, StoreError> {
    Ok(store
        .find_issue(id)
        .await?
        .filter(|issue| issue.project_id == project.id))
}

async fn load_issue(store: &dyn Store, project: &Project, id: u64) -> Result<Issue, IssueAppError> {
    find_project_issue(store, project, id)
        .await?
        .ok_or_else(|| IssueAppError::issue_not_found(project, id))
}

fn ensure_readable(ctx: &RequestContext, project: &Project) -> Result<(), IssueAppError> {
    if can_perform(&ctx.user, &Resource::Project(project), Operation::Read) {
        Ok(())
    } else {
        Err(IssueAppError::unauthorized(
            project,
            format!("{} issues", Operation::Read),
        ))
    }
}

fn ensure_issue_allowed(
    ctx: &RequestContext,
    project: &Project,
    issue: &Issue,
    operation: Operation,
) -> Result<(), IssueAppError> {
    let resource = Resource::Issue { project, issue };
    if can_perform(&ctx.user, &resource, operation) {
        Ok(())
    } else {
        Err(IssueAppError::unauthorized(
            project,
            format!("{} issue {}", operation, issue.id),
        ))
    }
}

fn ensure_creatable(
    ctx: &RequestContext,
    project: &Project,
    resource_type: ResourceType,
) -> Result<(), IssueAppError> {
    if can_create(&ctx.user, project, resource_type) {
        Ok(())
    } else {
        Err(IssueAppError::unauthorized(
            project,
            format!("create an {}", resource_type),
        ))
    }
}

fn listing_url(project: &Project) -> String {
    routes::default_issues_url(&project.owner, &project.name)
}

/// List the issues of a project matching `condition`, one page at a time.
/// `format` of `xls` exports every match instead.
pub async fn list_issues(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    condition: &SearchCondition,
    format: &str,
) -> Result<Reply, IssueAppError> {
    if format.eq_ignore_ascii_case("xls") {
        return export_issues(store, ctx, owner, name, condition).await;
    }

    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;

    let query = condition.build_query(&project, store).await?;
    let page = store
        .find_issue_page(&query, condition.page_num, ITEMS_PER_PAGE)
        .await?;
    let lookups = Lookups::load(store, &project, &page.items).await?;

    debug!(
        request_id = %ctx.request_id,
        project = %format!("{}/{}", owner, name),
        page = page.index,
        total = page.total_count,
        "Listing issues"
    );

    let page_url = |number: usize| {
        routes::search_url(&project.owner, &project.name, condition, "html", Some(number))
    };
    let page_context = PageContext {
        number: page.index + 1,
        total_pages: page.total_pages().max(1),
        total_count: page.total_count,
        prev_url: page.has_prev().then(|| page_url(page.index)),
        next_url: page.has_next().then(|| page_url(page.index + 2)),
    };

    let labels = store
        .labels_for_project(project.id)
        .await?
        .iter()
        .map(|l| view::label_context(l, condition.label_ids.contains(&l.id)))
        .collect();
    let milestones = store
        .milestones_for_project(project.id)
        .await?
        .iter()
        .map(|m| view::milestone_context(m, condition.milestone_id == Some(m.id)))
        .collect();
    let order = condition.order();

    let context = IssueListContext {
        title: view::LIST_TITLE.to_string(),
        project: view::project_context(&project.owner, &project.name),
        condition: ConditionContext {
            state: condition.state.clone(),
            filter: condition.filter.clone().unwrap_or_default(),
            author_login_id: condition.author_login_id.clone().unwrap_or_default(),
            assignee_id: condition.assignee_id,
            commented_check: condition.commented_check,
            order_by: order.map(|o| o.field.as_str().to_string()).unwrap_or_default(),
            order_dir: order
                .map(|o| o.direction.as_str().to_string())
                .unwrap_or_default(),
        },
        states: view::listing_states(&condition.state),
        issues: page.items.iter().map(|i| lookups.row(&project, i)).collect(),
        labels,
        milestones,
        page: page_context,
        export_url: routes::search_url(&project.owner, &project.name, condition, "xls", None),
        can_create: can_create(&ctx.user, &project, ResourceType::IssuePost),
    };
    Ok(Reply::Render(View::IssueList(context)))
}

/// Every issue matching `condition`, as a spreadsheet named after the project
pub async fn export_issues(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    condition: &SearchCondition,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;

    let query = condition.build_query(&project, store).await?;
    let issues = store.find_issues(&query).await?;
    let lookups = Lookups::load(store, &project, &issues).await?;
    let rows: Vec<_> = issues.iter().map(|i| lookups.export_row(i)).collect();

    let file = excel_save(&rows, &format!("{}_issues", project.name))?;
    info!(
        request_id = %ctx.request_id,
        project = %format!("{}/{}", owner, name),
        rows = rows.len(),
        file = %file.file_name,
        "Exported issues"
    );
    Ok(Reply::Download(file))
}

/// Detail page of one issue, or the not-existing page when it is gone
pub async fn get_issue(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    issue_id: u64,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;

    let Some(issue) = find_project_issue(store, &project, issue_id).await? else {
        debug!(request_id = %ctx.request_id, issue_id, "Issue does not exist");
        return Ok(Reply::Render(View::NotExisting(view::not_existing_context(
            &project.owner,
            &project.name,
        ))));
    };

    ensure_issue_allowed(ctx, &project, &issue, Operation::Read)?;
    let resource = Resource::Issue {
        project: &project,
        issue: &issue,
    };

    let lookups = Lookups::load(store, &project, std::slice::from_ref(&issue)).await?;
    let comments = store
        .comments_for_issue(issue.id)
        .await?
        .iter()
        .map(|c| {
            let can_delete = can_perform(
                &ctx.user,
                &Resource::Comment {
                    project: &project,
                    comment: c,
                },
                Operation::Delete,
            );
            view::comment_context(&project, c, can_delete)
        })
        .collect();
    let attachments = store
        .attachments_for(AttachmentContainer::Issue(issue.id))
        .await?
        .into_iter()
        .map(|a| AttachmentContext {
            name: a.name,
            size: a.size,
            mime_type: a.mime_type,
        })
        .collect();

    let (owner, name) = (&project.owner, &project.name);
    let context = IssueDetailContext {
        title: format!("#{} {}", issue.id, issue.title),
        project: view::project_context(owner, name),
        issue: lookups.row(&project, &issue),
        body: issue.body.clone(),
        comments,
        attachments,
        edit_url: can_perform(&ctx.user, &resource, Operation::Update)
            .then(|| routes::edit_issue_url(owner, name, issue.id)),
        delete_url: can_perform(&ctx.user, &resource, Operation::Delete)
            .then(|| routes::delete_issue_url(owner, name, issue.id)),
        comment_url: can_create(&ctx.user, &project, ResourceType::IssueComment)
            .then(|| routes::new_comment_url(owner, name, issue.id)),
    };
    Ok(Reply::Render(View::IssueDetail(context)))
}

pub async fn new_issue_form(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_creatable(ctx, &project, ResourceType::IssuePost)?;

    let context =
        view::issue_form_context(store, &project, &IssueForm::default(), &FormErrors::new(), None)
            .await?;
    Ok(Reply::Render(View::NewIssue(context)))
}

/// Record errors for referenced labels, milestone or assignee that don't
/// exist or live in another project
async fn check_references(
    store: &dyn Store,
    project: &Project,
    valid: &ValidIssueForm,
) -> Result<FormErrors, StoreError> {
    let mut errors = FormErrors::new();

    for id in &valid.label_ids {
        let label = store.find_label(*id).await?;
        if label.map_or(true, |l| l.project_id != project.id) {
            errors.add("labelIds", format!("Label {} does not belong to this project", id));
        }
    }

    if let Some(id) = valid.milestone_id {
        let milestone = store.find_milestone(id).await?;
        if milestone.map_or(true, |m| m.project_id != project.id) {
            errors.add(
                "milestoneId",
                format!("Milestone {} does not belong to this project", id),
            );
        }
    }

    if let Some(id) = valid.assignee_id {
        if store.find_user(id).await?.is_none() {
            errors.add("assigneeId", format!("User {} does not exist", id));
        }
    }

    Ok(errors)
}

/// Validate `form` completely, or build the error reply re-rendering it
async fn validate_issue_form(
    store: &dyn Store,
    project: &Project,
    form: &IssueForm,
    issue_id: Option<u64>,
) -> Result<ValidIssueForm, IssueAppError> {
    let errors = match form.validate() {
        Ok(valid) => {
            let errors = check_references(store, project, &valid).await?;
            if errors.is_empty() {
                return Ok(valid);
            }
            errors
        }
        Err(errors) => errors,
    };

    let context = view::issue_form_context(store, project, form, &errors, issue_id).await?;
    let view = match issue_id {
        Some(_) => View::EditIssue(context),
        None => View::NewIssue(context),
    };
    Err(IssueAppError::InvalidIssue {
        errors,
        view: Box::new(view),
    })
}

pub async fn create_issue(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    form: &IssueForm,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_creatable(ctx, &project, ResourceType::IssuePost)?;

    let valid = validate_issue_form(store, &project, form, None).await?;
    let issue = store
        .insert_issue(NewIssue {
            title: valid.title,
            body: valid.body,
            created_date: crate::utils::now(),
            author_id: ctx.user.id,
            author_login_id: ctx.user.login_id.clone(),
            author_name: ctx.user.name.clone(),
            project_id: project.id,
            state: State::Open,
            milestone_id: valid.milestone_id,
            assignee: valid.assignee_id.map(|user_id| Assignee {
                user_id,
                project_id: project.id,
            }),
            label_ids: valid.label_ids,
        })
        .await?;
    let attached = store
        .attach_files(ctx.user.id, AttachmentContainer::Issue(issue.id))
        .await?;

    info!(
        request_id = %ctx.request_id,
        user = %ctx.user.login_id,
        project = %format!("{}/{}", owner, name),
        issue_id = issue.id,
        attached,
        "Issue created"
    );
    Ok(Reply::Redirect(listing_url(&project)))
}

pub async fn edit_issue_form(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    issue_id: u64,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;
    let issue = load_issue(store, &project, issue_id).await?;
    ensure_issue_allowed(ctx, &project, &issue, Operation::Update)?;

    let form = IssueForm::fill(&issue);
    let context =
        view::issue_form_context(store, &project, &form, &FormErrors::new(), Some(issue.id))
            .await?;
    Ok(Reply::Render(View::EditIssue(context)))
}

pub async fn update_issue(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    issue_id: u64,
    form: &IssueForm,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;
    let original = load_issue(store, &project, issue_id).await?;
    ensure_issue_allowed(ctx, &project, &original, Operation::Update)?;
    let valid = validate_issue_form(store, &project, form, Some(issue_id)).await?;

    let label_ids = valid.label_ids;
    let mut updated = original.clone();
    updated.title = valid.title;
    updated.body = valid.body;
    updated.state = valid.state.unwrap_or(original.state);
    updated.milestone_id = valid.milestone_id;
    updated.assignee = valid.assignee_id.map(|user_id| Assignee {
        user_id,
        project_id: project.id,
    });

    let project_id = project.id;
    let saved = edit_posting(store, ctx, &project, &original, updated, move |mut issue| {
        issue.project_id = project_id;
        issue.label_ids = label_ids;
        issue
    })
    .await?;

    info!(
        request_id = %ctx.request_id,
        issue_id = saved.id,
        state = %saved.state,
        "Issue updated"
    );
    Ok(Reply::Redirect(routes::issue_url(
        &project.owner,
        &project.name,
        saved.id,
    )))
}

/// Delete an issue with its comments and attachments
pub async fn delete_issue(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    issue_id: u64,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;
    let issue = load_issue(store, &project, issue_id).await?;

    delete_posting(store, ctx, &project, &issue).await?;
    Ok(Reply::Redirect(listing_url(&project)))
}

pub async fn add_comment(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    issue_id: u64,
    form: &CommentForm,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;
    let issue = load_issue(store, &project, issue_id).await?;
    ensure_creatable(ctx, &project, ResourceType::IssueComment)?;
    let body = form.validate().map_err(IssueAppError::InvalidComment)?;

    new_comment(store, ctx, &project, body, |mut comment| {
        comment.issue_id = issue.id;
        comment
    })
    .await?;

    Ok(Reply::Redirect(routes::issue_url(
        &project.owner,
        &project.name,
        issue.id,
    )))
}

pub async fn delete_comment(
    store: &dyn Store,
    ctx: &RequestContext,
    owner: &str,
    name: &str,
    issue_id: u64,
    comment_id: u64,
) -> Result<Reply, IssueAppError> {
    let project = load_project(store, owner, name).await?;
    ensure_readable(ctx, &project)?;
    let issue = load_issue(store, &project, issue_id).await?;
    let comment = store
        .find_comment(comment_id)
        .await?
        .filter(|c| c.issue_id == issue.id)
        .ok_or_else(|| IssueAppError::comment_not_found(&project, comment_id))?;

    delete_posting(store, ctx, &project, &comment).await?;
    Ok(Reply::Redirect(routes::issue_url(
        &project.owner,
        &project.name,
        issue.id,
    )))
}
