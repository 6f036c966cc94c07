//! Capability checks.
//!
//! Every check is a pure function of the acting user, a resource descriptor
//! and an operation. Nothing here touches the store.

use crate::model::{Issue, IssueComment, Project, User};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Kinds of entities that can be created inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    IssuePost,
    IssueComment,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::IssuePost => write!(f, "issue"),
            ResourceType::IssueComment => write!(f, "issue comment"),
        }
    }
}

/// An authorization-checkable handle for an existing entity
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Project(&'a Project),
    Issue {
        project: &'a Project,
        issue: &'a Issue,
    },
    Comment {
        project: &'a Project,
        comment: &'a IssueComment,
    },
}

impl<'a> Resource<'a> {
    pub fn project(&self) -> &'a Project {
        match *self {
            Resource::Project(project) => project,
            Resource::Issue { project, .. } | Resource::Comment { project, .. } => project,
        }
    }

    fn author_id(&self) -> Option<u64> {
        match self {
            Resource::Project(_) => None,
            Resource::Issue { issue, .. } => Some(issue.author_id),
            Resource::Comment { comment, .. } => Some(comment.author_id),
        }
    }
}

fn can_read_project(user: &User, project: &Project) -> bool {
    project.is_public || project.is_member(user)
}

/// Whether `user` may apply `operation` to `resource`
pub fn can_perform(user: &User, resource: &Resource<'_>, operation: Operation) -> bool {
    let project = resource.project();

    if user.site_admin || project.is_manager(user) {
        return true;
    }

    match operation {
        Operation::Read => can_read_project(user, project),
        Operation::Update | Operation::Delete => match resource.author_id() {
            Some(author_id) => {
                !user.is_anonymous()
                    && author_id == user.id
                    && can_read_project(user, project)
            }
            None => false,
        },
    }
}

/// Whether `user` may create a new entity of `resource_type` in `project`
pub fn can_create(user: &User, project: &Project, resource_type: ResourceType) -> bool {
    if user.site_admin || project.is_manager(user) {
        return true;
    }

    match resource_type {
        ResourceType::IssuePost | ResourceType::IssueComment => {
            !user.is_anonymous() && can_read_project(user, project)
        }
    }
}
