use super::user::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Manager,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub user_id: u64,
    pub role: ProjectRole,
}

/// A hosted project. Issues, labels and milestones all belong to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    /// Login id of the owning user
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
}

impl Project {
    pub fn role_of(&self, user: &User) -> Option<ProjectRole> {
        if user.is_anonymous() {
            return None;
        }
        if self.owner == user.login_id {
            return Some(ProjectRole::Manager);
        }
        self.members
            .iter()
            .find(|m| m.user_id == user.id)
            .map(|m| m.role)
    }

    pub fn is_member(&self, user: &User) -> bool {
        self.role_of(user).is_some()
    }

    pub fn is_manager(&self, user: &User) -> bool {
        self.role_of(user) == Some(ProjectRole::Manager)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: u64,
    pub project_id: u64,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: 1,
            owner: "owner".to_string(),
            name: "forge".to_string(),
            is_public: true,
            members: vec![ProjectMember {
                user_id: 3,
                role: ProjectRole::Member,
            }],
        }
    }

    #[test]
    fn test_owner_is_manager() {
        let owner = User::new(1, "owner", "Owner");
        assert!(project().is_manager(&owner));
    }

    #[test]
    fn test_member_role() {
        let member = User::new(3, "member", "Member");
        assert_eq!(project().role_of(&member), Some(ProjectRole::Member));
        assert!(!project().is_manager(&member));
    }

    #[test]
    fn test_anonymous_has_no_role() {
        assert_eq!(project().role_of(&User::anonymous()), None);
    }
}
