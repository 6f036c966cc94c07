//! HTTP front of the daemon.
//!
//! Routes form-encoded browser requests to the issue handlers and turns their
//! replies into HTML pages, redirects and downloads.

mod handlers;
mod response;

use crate::config::DaemonConfig;
use crate::issue::RequestContext;
use crate::model::User;
use crate::store::Store;
use crate::template::TemplateEngine;
use axum::routing::{get, post};
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

static LOGIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("valid login id pattern"));

/// Shared state of every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub templates: Arc<TemplateEngine>,
    pub config: Arc<DaemonConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, templates: TemplateEngine, config: DaemonConfig) -> Self {
        Self {
            store,
            templates: Arc::new(templates),
            config: Arc::new(config),
        }
    }

    /// Resolve the acting user from the login header set by the upstream proxy.
    /// Missing, malformed or unknown logins act as the anonymous user.
    pub async fn request_context(&self, headers: &HeaderMap) -> RequestContext {
        let login = headers
            .get(self.config.login_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let user = match login {
            Some(login) if LOGIN_ID.is_match(login) => {
                match self.store.find_user_by_login_id(login).await {
                    Ok(Some(user)) => user,
                    Ok(None) => {
                        debug!(login = login, "Unknown login, serving as anonymous");
                        User::anonymous()
                    }
                    Err(e) => {
                        warn!(login = login, error = %e, "User lookup failed, serving as anonymous");
                        User::anonymous()
                    }
                }
            }
            Some(login) => {
                warn!(login = login, "Malformed login header, serving as anonymous");
                User::anonymous()
            }
            None => User::anonymous(),
        };

        let ctx = RequestContext::new(user);
        debug!(request_id = %ctx.request_id, user = %ctx.user.login_id, "Request context");
        ctx
    }
}

/// All issue routes, with request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/{owner}/{project}/issues",
            get(handlers::list_issues).post(handlers::create_issue),
        )
        .route("/{owner}/{project}/issues/new", get(handlers::new_issue_form))
        .route("/{owner}/{project}/issue/{id}", get(handlers::get_issue))
        .route(
            "/{owner}/{project}/issue/{id}/edit",
            get(handlers::edit_issue_form).post(handlers::update_issue),
        )
        .route(
            "/{owner}/{project}/issue/{id}/delete",
            post(handlers::delete_issue),
        )
        .route(
            "/{owner}/{project}/issue/{id}/comments",
            post(handlers::add_comment),
        )
        .route(
            "/{owner}/{project}/issue/{id}/comment/{comment_id}/delete",
            post(handlers::delete_comment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the given origins. `*` allows any origin; other entries match by prefix.
pub fn cors_layer(origins: Vec<String>) -> CorsLayer {
    let allow_all = origins.iter().any(|o| o == "*");

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            if allow_all {
                return true;
            }
            match origin.to_str() {
                Ok(origin) => origins.iter().any(|allowed| origin.starts_with(allowed)),
                Err(_) => false,
            }
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
}
