//! Turns listing request parameters into an [`IssueQuery`].

use super::form::FormData;
use crate::model::{Project, State};
use crate::store::{Clause, IssueQuery, OrderBy, SortDirection, SortField, Store, StoreError};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Fixed size of one listing page
pub const ITEMS_PER_PAGE: usize = 15;

pub const DEFAULT_STATE: &str = "open";

/// Filter criteria of an issue listing, bound fresh for every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCondition {
    pub filter: Option<String>,
    /// Raw state token: `open`, `closed`, anything else means every state
    pub state: String,
    pub milestone_id: Option<u64>,
    pub label_ids: BTreeSet<u64>,
    /// Exact login id, or a fragment of one
    pub author_login_id: Option<String>,
    pub assignee_id: Option<u64>,
    pub commented_check: bool,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
    /// Zero-based page index
    pub page_num: usize,
}

impl Default for SearchCondition {
    fn default() -> Self {
        Self {
            filter: None,
            state: DEFAULT_STATE.to_string(),
            milestone_id: None,
            label_ids: BTreeSet::new(),
            author_login_id: None,
            assignee_id: None,
            commented_check: false,
            order_by: None,
            order_dir: None,
            page_num: 0,
        }
    }
}

fn parse_param(name: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(param = name, value = value, "Ignoring unparseable parameter");
            None
        }
    }
}

fn is_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

impl SearchCondition {
    /// Bind from listing query parameters. `pageNum` is 1-based on the wire.
    pub fn bind(params: &FormData) -> Self {
        let page_num = params
            .non_blank("pageNum")
            .and_then(|v| match v.parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!(param = "pageNum", value = v, "Ignoring unparseable parameter");
                    None
                }
            })
            .map(|n| usize::try_from(n.saturating_sub(1)).unwrap_or(0))
            .unwrap_or(0);

        Self {
            filter: params.non_blank("filter").map(str::to_string),
            state: params
                .non_blank("state")
                .unwrap_or(DEFAULT_STATE)
                .to_string(),
            milestone_id: params
                .non_blank("milestoneId")
                .and_then(|v| parse_param("milestoneId", v)),
            label_ids: params
                .all("labelIds")
                .into_iter()
                .filter(|v| !v.trim().is_empty())
                .filter_map(|v| parse_param("labelIds", v))
                .collect(),
            author_login_id: params.non_blank("authorLoginId").map(str::to_string),
            assignee_id: params
                .non_blank("assigneeId")
                .and_then(|v| parse_param("assigneeId", v)),
            commented_check: params.first("commentedCheck").is_some_and(is_checked),
            order_by: params.non_blank("orderBy").map(str::to_string),
            order_dir: params.non_blank("orderDir").map(str::to_string),
            page_num,
        }
    }

    /// Parsed state constraint; `None` when every state is wanted
    pub fn state_filter(&self) -> Option<State> {
        State::parse(&self.state)
    }

    /// Requested ordering. An unknown field yields no ordering.
    pub fn order(&self) -> Option<OrderBy> {
        let raw = self.order_by.as_deref()?;
        let Some(field) = SortField::parse(raw) else {
            debug!(order_by = raw, "Ignoring unknown sort field");
            return None;
        };
        let direction = self
            .order_dir
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or(SortDirection::Desc);
        Some(OrderBy { field, direction })
    }

    /// Query parameters that reproduce this condition, without page or format
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("state", self.state.clone())];
        if let Some(filter) = &self.filter {
            params.push(("filter", filter.clone()));
        }
        if let Some(id) = self.milestone_id {
            params.push(("milestoneId", id.to_string()));
        }
        for id in &self.label_ids {
            params.push(("labelIds", id.to_string()));
        }
        if let Some(login) = &self.author_login_id {
            params.push(("authorLoginId", login.clone()));
        }
        if let Some(id) = self.assignee_id {
            params.push(("assigneeId", id.to_string()));
        }
        if self.commented_check {
            params.push(("commentedCheck", "true".to_string()));
        }
        if let Some(order_by) = &self.order_by {
            params.push(("orderBy", order_by.clone()));
        }
        if let Some(order_dir) = &self.order_dir {
            params.push(("orderDir", order_dir.clone()));
        }
        params
    }

    /// Build the query selecting the issues of `project` this condition matches.
    ///
    /// The store is consulted only to resolve the author filter. An author
    /// fragment matching nobody produces a query with no results.
    pub async fn build_query(
        &self,
        project: &Project,
        store: &dyn Store,
    ) -> Result<IssueQuery, StoreError> {
        let mut query = IssueQuery::new().and(Clause::Project(project.id));

        if let Some(filter) = self.filter.as_deref().map(str::trim) {
            if !filter.is_empty() {
                query.push(Clause::TextContains(filter.to_string()));
            }
        }

        if let Some(login) = self.author_login_id.as_deref() {
            let exact = store.find_user_by_login_id(login).await?;
            match exact {
                Some(user) if !user.is_anonymous() => query.push(Clause::Author(user.id)),
                _ => {
                    let ids = store
                        .find_users_by_login_fragment(login)
                        .await?
                        .into_iter()
                        .map(|u| u.id)
                        .collect();
                    query.push(Clause::AuthorIn(ids));
                }
            }
        }

        if let Some(user_id) = self.assignee_id {
            query.push(Clause::Assignee {
                user_id,
                project_id: project.id,
            });
        }

        if let Some(id) = self.milestone_id {
            query.push(Clause::Milestone(id));
        }

        for id in &self.label_ids {
            query.push(Clause::HasLabel(*id));
        }

        if self.commented_check {
            query.push(Clause::MinComments(1));
        }

        if let Some(state) = self.state_filter() {
            query.push(Clause::State(state));
        }

        if let Some(order) = self.order() {
            query = query.order_by(order);
        }

        debug!(
            project = %format!("{}/{}", project.owner, project.name),
            clauses = query.clauses.len(),
            "Built issue query"
        );
        Ok(query)
    }
}
