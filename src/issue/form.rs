//! Binding and validation of form-encoded request data.

use crate::model::{Issue, State};
use std::collections::BTreeSet;
use std::fmt;

/// Decoded `application/x-www-form-urlencoded` pairs, in request order.
/// Keys may repeat (`labelIds=1&labelIds=2`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(input: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(input).into_owned().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, `None` when missing or blank
    pub fn non_blank(&self, key: &str) -> Option<&str> {
        self.first(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Validation failures collected while binding a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

fn parse_id(errors: &mut FormErrors, field: &str, value: Option<&str>) -> Option<u64> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse::<u64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, format!("'{}' is not a valid id", value));
            None
        }
    }
}

/// Issue fields as submitted, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueForm {
    pub title: String,
    pub body: String,
    /// Only bound on the edit form
    pub state: Option<String>,
    pub milestone_id: Option<String>,
    pub assignee_id: Option<String>,
    pub label_ids: Vec<String>,
}

/// Issue fields after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidIssueForm {
    pub title: String,
    pub body: String,
    pub state: Option<State>,
    pub milestone_id: Option<u64>,
    pub assignee_id: Option<u64>,
    pub label_ids: BTreeSet<u64>,
}

impl IssueForm {
    pub fn bind(data: &FormData) -> Self {
        Self {
            title: data.first("title").unwrap_or_default().to_string(),
            body: data.first("body").unwrap_or_default().to_string(),
            state: data.non_blank("state").map(str::to_string),
            milestone_id: data.non_blank("milestoneId").map(str::to_string),
            assignee_id: data.non_blank("assigneeId").map(str::to_string),
            label_ids: data
                .all("labelIds")
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Form pre-filled from a stored issue
    pub fn fill(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            body: issue.body.clone(),
            state: Some(issue.state.token().to_string()),
            milestone_id: issue.milestone_id.map(|id| id.to_string()),
            assignee_id: issue.assignee.map(|a| a.user_id.to_string()),
            label_ids: issue.label_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<ValidIssueForm, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        }
        if self.body.trim().is_empty() {
            errors.add("body", "Body is required");
        }

        let state = match self.state.as_deref() {
            Some(token) => {
                let parsed = State::parse(token);
                if parsed.is_none() {
                    errors.add("state", format!("'{}' is not a valid state", token));
                }
                parsed
            }
            None => None,
        };

        let milestone_id = parse_id(&mut errors, "milestoneId", self.milestone_id.as_deref());
        let assignee_id = parse_id(&mut errors, "assigneeId", self.assignee_id.as_deref());
        let label_ids = self
            .label_ids
            .iter()
            .filter_map(|raw| parse_id(&mut errors, "labelIds", Some(raw.as_str())))
            .collect();

        errors.into_result(ValidIssueForm {
            title: title.to_string(),
            body: self.body.clone(),
            state,
            milestone_id,
            assignee_id,
            label_ids,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForm {
    pub body: String,
}

impl CommentForm {
    pub fn bind(data: &FormData) -> Self {
        Self {
            body: data.first("body").unwrap_or_default().to_string(),
        }
    }

    /// The comment body, once known to be non-blank
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        if self.body.trim().is_empty() {
            errors.add("body", "Comment body is required");
        }
        errors.into_result(self.body.clone())
    }
}
