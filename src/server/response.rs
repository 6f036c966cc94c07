use super::AppState;
use crate::issue::{not_existing_context, unauthorized_context, IssueAppError, Reply};
use crate::template::View;
use axum::response::{Html, IntoResponse, Redirect, Response};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::StatusCode;
use tracing::{debug, error};

fn render(state: &AppState, status: StatusCode, view: &View) -> Response {
    match state.templates.render(view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(template = view.template_name(), error = %e, "Failed to render view");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Turn a handler outcome into an HTTP response
pub(super) fn respond(state: &AppState, result: Result<Reply, IssueAppError>) -> Response {
    match result {
        Ok(Reply::Render(view)) => render(state, StatusCode::OK, &view),
        Ok(Reply::Redirect(location)) => Redirect::to(&location).into_response(),
        Ok(Reply::Download(file)) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, file.content_type()),
                (CONTENT_DISPOSITION, file.content_disposition()),
            ],
            file.content,
        )
            .into_response(),
        Err(e) => error_response(state, e),
    }
}

fn error_response(state: &AppState, err: IssueAppError) -> Response {
    debug!(error = %err, "Request failed");
    match err {
        IssueAppError::Unauthorized {
            owner,
            name,
            action,
        } => render(
            state,
            StatusCode::UNAUTHORIZED,
            &View::Unauthorized(unauthorized_context(&owner, &name, &action)),
        ),
        IssueAppError::IssueNotFound { owner, name, .. }
        | IssueAppError::CommentNotFound { owner, name, .. } => render(
            state,
            StatusCode::NOT_FOUND,
            &View::NotExisting(not_existing_context(&owner, &name)),
        ),
        IssueAppError::InvalidIssue { view, .. } => render(state, StatusCode::BAD_REQUEST, &view),
        IssueAppError::InvalidComment(errors) => {
            (StatusCode::BAD_REQUEST, errors.to_string()).into_response()
        }
        err @ IssueAppError::ProjectNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        err @ (IssueAppError::StoreError(_) | IssueAppError::ExportError(_)) => {
            error!(error = %err, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
