//! Query descriptions handed to the store.
//!
//! An [`IssueQuery`] is a conjunction of [`Clause`]s plus an optional
//! ordering. The store decides how to evaluate it; the in-memory backend
//! uses [`IssueQuery::matches`] and [`IssueQuery::sort`] directly.

use crate::model::{Issue, State};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A single predicate over an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Project(u64),
    /// Title or body contains the text, ignoring case
    TextContains(String),
    Author(u64),
    /// Author is one of the ids. An empty set matches nothing.
    AuthorIn(BTreeSet<u64>),
    Assignee { user_id: u64, project_id: u64 },
    Milestone(u64),
    HasLabel(u64),
    MinComments(u32),
    State(State),
}

impl Clause {
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Clause::Project(id) => issue.project_id == *id,
            Clause::TextContains(text) => {
                let needle = text.to_lowercase();
                issue.title.to_lowercase().contains(&needle)
                    || issue.body.to_lowercase().contains(&needle)
            }
            Clause::Author(id) => issue.author_id == *id,
            Clause::AuthorIn(ids) => ids.contains(&issue.author_id),
            Clause::Assignee {
                user_id,
                project_id,
            } => issue
                .assignee
                .map(|a| a.user_id == *user_id && a.project_id == *project_id)
                .unwrap_or(false),
            Clause::Milestone(id) => issue.milestone_id == Some(*id),
            Clause::HasLabel(id) => issue.has_label(*id),
            Clause::MinComments(min) => issue.num_of_comments >= *min,
            Clause::State(state) => issue.state == *state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    CreatedDate,
    Title,
    NumOfComments,
}

impl SortField {
    /// Parse the request's `orderBy` value. Only known columns are accepted.
    pub fn parse(value: &str) -> Option<SortField> {
        match value.trim() {
            "id" => Some(SortField::Id),
            "createdDate" => Some(SortField::CreatedDate),
            "title" => Some(SortField::Title),
            "numOfComments" => Some(SortField::NumOfComments),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::CreatedDate => "createdDate",
            SortField::Title => "title",
            SortField::NumOfComments => "numOfComments",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<SortDirection> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueQuery {
    pub clauses: Vec<Clause>,
    pub order: Option<OrderBy>,
}

impl IssueQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        self.clauses.iter().all(|c| c.matches(issue))
    }

    /// Apply the requested ordering. Without one, the input order is kept.
    /// Ties fall back to ascending id so pages stay stable.
    pub fn sort(&self, issues: &mut [Issue]) {
        let Some(order) = self.order else {
            return;
        };

        issues.sort_by(|a, b| {
            let ordering = match order.field {
                SortField::Id => a.id.cmp(&b.id),
                SortField::CreatedDate => a.created_date.cmp(&b.created_date),
                SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                SortField::NumOfComments => a.num_of_comments.cmp(&b.num_of_comments),
            };
            let ordering = match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            match ordering {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            }
        });
    }
}

/// One page of a larger result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index
    pub index: usize,
    pub page_size: usize,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total_pages()
    }
}

/// Slice one page out of a fully evaluated result
pub fn paginate<T>(all: Vec<T>, index: usize, page_size: usize) -> Page<T> {
    let total_count = all.len();
    let items = all
        .into_iter()
        .skip(index.saturating_mul(page_size))
        .take(page_size)
        .collect();
    Page {
        items,
        index,
        page_size,
        total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Assignee;
    use chrono::{TimeZone, Utc};

    fn issue(id: u64, title: &str, state: State) -> Issue {
        Issue {
            id,
            title: title.to_string(),
            body: String::new(),
            created_date: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
            author_id: 1,
            author_login_id: "alice".to_string(),
            author_name: "Alice".to_string(),
            project_id: 1,
            state,
            milestone_id: None,
            assignee: None,
            label_ids: BTreeSet::new(),
            num_of_comments: 0,
        }
    }

    #[test]
    fn test_text_contains_ignores_case() {
        let mut target = issue(1, "Crash on Startup", State::Open);
        target.body = "Segfault in the LOADER".to_string();

        assert!(Clause::TextContains("startup".to_string()).matches(&target));
        assert!(Clause::TextContains("loader".to_string()).matches(&target));
        assert!(!Clause::TextContains("shutdown".to_string()).matches(&target));
    }

    #[test]
    fn test_empty_author_set_matches_nothing() {
        let target = issue(1, "a", State::Open);
        assert!(!Clause::AuthorIn(BTreeSet::new()).matches(&target));
    }

    #[test]
    fn test_assignee_must_match_project() {
        let mut target = issue(1, "a", State::Open);
        target.assignee = Some(Assignee {
            user_id: 5,
            project_id: 2,
        });

        assert!(Clause::Assignee {
            user_id: 5,
            project_id: 2
        }
        .matches(&target));
        assert!(!Clause::Assignee {
            user_id: 5,
            project_id: 1
        }
        .matches(&target));
    }

    #[test]
    fn test_query_is_conjunction() {
        let target = issue(1, "a", State::Open);
        let query = IssueQuery::new()
            .and(Clause::Project(1))
            .and(Clause::State(State::Closed));
        assert!(!query.matches(&target));
        assert!(IssueQuery::new().matches(&target));
    }

    #[test]
    fn test_sort_by_title_desc() {
        let mut issues = vec![
            issue(1, "alpha", State::Open),
            issue(2, "Charlie", State::Open),
            issue(3, "bravo", State::Open),
        ];
        let query = IssueQuery::new().order_by(OrderBy {
            field: SortField::Title,
            direction: SortDirection::Desc,
        });
        query.sort(&mut issues);

        let ids: Vec<u64> = issues.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_unordered_query_keeps_input_order() {
        let mut issues = vec![issue(3, "c", State::Open), issue(1, "a", State::Open)];
        IssueQuery::new().sort(&mut issues);
        assert_eq!(issues[0].id, 3);
    }

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!(SortField::parse("createdDate"), Some(SortField::CreatedDate));
        assert_eq!(SortField::parse("title; drop table"), None);
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=35).collect::<Vec<u32>>(), 2, 15);
        assert_eq!(page.items, vec![31, 32, 33, 34, 35]);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 5, 15);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
    }
}
