//! Route functions: extract, delegate to `issue`, respond.

use super::response::respond;
use super::AppState;
use crate::issue::{self, CommentForm, FormData, IssueForm, SearchCondition};
use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::response::Response;
use http::HeaderMap;

type ProjectPath = Path<(String, String)>;
type IssuePath = Path<(String, String, u64)>;

pub(super) async fn list_issues(
    State(state): State<AppState>,
    Path((owner, project)): ProjectPath,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let params = FormData::parse(query.unwrap_or_default().as_bytes());
    let condition = SearchCondition::bind(&params);
    let format = params.non_blank("format").unwrap_or("html");

    let result =
        issue::list_issues(state.store.as_ref(), &ctx, &owner, &project, &condition, format).await;
    respond(&state, result)
}

pub(super) async fn new_issue_form(
    State(state): State<AppState>,
    Path((owner, project)): ProjectPath,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let result = issue::new_issue_form(state.store.as_ref(), &ctx, &owner, &project).await;
    respond(&state, result)
}

pub(super) async fn create_issue(
    State(state): State<AppState>,
    Path((owner, project)): ProjectPath,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let form = IssueForm::bind(&FormData::parse(&body));
    let result = issue::create_issue(state.store.as_ref(), &ctx, &owner, &project, &form).await;
    respond(&state, result)
}

pub(super) async fn get_issue(
    State(state): State<AppState>,
    Path((owner, project, id)): IssuePath,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let result = issue::get_issue(state.store.as_ref(), &ctx, &owner, &project, id).await;
    respond(&state, result)
}

pub(super) async fn edit_issue_form(
    State(state): State<AppState>,
    Path((owner, project, id)): IssuePath,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let result = issue::edit_issue_form(state.store.as_ref(), &ctx, &owner, &project, id).await;
    respond(&state, result)
}

pub(super) async fn update_issue(
    State(state): State<AppState>,
    Path((owner, project, id)): IssuePath,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let form = IssueForm::bind(&FormData::parse(&body));
    let result =
        issue::update_issue(state.store.as_ref(), &ctx, &owner, &project, id, &form).await;
    respond(&state, result)
}

pub(super) async fn delete_issue(
    State(state): State<AppState>,
    Path((owner, project, id)): IssuePath,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let result = issue::delete_issue(state.store.as_ref(), &ctx, &owner, &project, id).await;
    respond(&state, result)
}

pub(super) async fn add_comment(
    State(state): State<AppState>,
    Path((owner, project, id)): IssuePath,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let form = CommentForm::bind(&FormData::parse(&body));
    let result = issue::add_comment(state.store.as_ref(), &ctx, &owner, &project, id, &form).await;
    respond(&state, result)
}

pub(super) async fn delete_comment(
    State(state): State<AppState>,
    Path((owner, project, id, comment_id)): Path<(String, String, u64, u64)>,
    headers: HeaderMap,
) -> Response {
    let ctx = state.request_context(&headers).await;
    let result =
        issue::delete_comment(state.store.as_ref(), &ctx, &owner, &project, id, comment_id).await;
    respond(&state, result)
}
