use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Issue lifecycle flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    Open,
    Closed,
}

impl State {
    /// Parse a state token case-insensitively.
    /// Tokens other than open/closed (for example "all") yield `None`.
    pub fn parse(token: &str) -> Option<State> {
        match token.trim().to_ascii_lowercase().as_str() {
            "open" => Some(State::Open),
            "closed" => Some(State::Closed),
            _ => None,
        }
    }

    /// Lowercase token used in URLs and forms
    pub fn token(&self) -> &'static str {
        match self {
            State::Open => "open",
            State::Closed => "closed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Open => write!(f, "OPEN"),
            State::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Assignment of an issue to a user, scoped to one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub user_id: u64,
    pub project_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLabel {
    pub id: u64,
    pub project_id: u64,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub created_date: DateTime<Utc>,
    pub author_id: u64,
    pub author_login_id: String,
    pub author_name: String,
    pub project_id: u64,
    pub state: State,
    #[serde(default)]
    pub milestone_id: Option<u64>,
    #[serde(default)]
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub label_ids: BTreeSet<u64>,
    #[serde(default)]
    pub num_of_comments: u32,
}

impl Issue {
    pub fn has_label(&self, label_id: u64) -> bool {
        self.label_ids.contains(&label_id)
    }
}

/// Data for inserting an issue; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub created_date: DateTime<Utc>,
    pub author_id: u64,
    pub author_login_id: String,
    pub author_name: String,
    pub project_id: u64,
    pub state: State,
    pub milestone_id: Option<u64>,
    pub assignee: Option<Assignee>,
    pub label_ids: BTreeSet<u64>,
}

impl NewIssue {
    pub fn into_issue(self, id: u64) -> Issue {
        Issue {
            id,
            title: self.title,
            body: self.body,
            created_date: self.created_date,
            author_id: self.author_id,
            author_login_id: self.author_login_id,
            author_name: self.author_name,
            project_id: self.project_id,
            state: self.state,
            milestone_id: self.milestone_id,
            assignee: self.assignee,
            label_ids: self.label_ids,
            num_of_comments: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_case_insensitive() {
        assert_eq!(State::parse("open"), Some(State::Open));
        assert_eq!(State::parse("OPEN"), Some(State::Open));
        assert_eq!(State::parse(" Closed "), Some(State::Closed));
    }

    #[test]
    fn test_parse_state_other_tokens() {
        assert_eq!(State::parse("all"), None);
        assert_eq!(State::parse(""), None);
        assert_eq!(State::parse("reopened"), None);
    }

    #[test]
    fn test_state_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&State::Closed).unwrap(), r#""CLOSED""#);
        assert_eq!(State::Open.to_string(), "OPEN");
        assert_eq!(State::Closed.token(), "closed");
    }
}
