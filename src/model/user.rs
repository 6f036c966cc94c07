use serde::{Deserialize, Serialize};

/// A registered user, or the anonymous sentinel for unauthenticated requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub login_id: String,
    pub name: String,
    #[serde(default)]
    pub site_admin: bool,
}

impl User {
    /// Id reserved for the anonymous user. Stored users never use it.
    pub const ANONYMOUS_ID: u64 = 0;

    pub fn new(id: u64, login_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            login_id: login_id.into(),
            name: name.into(),
            site_admin: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: Self::ANONYMOUS_ID,
            login_id: String::new(),
            name: "Guest".to_string(),
            site_admin: false,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == Self::ANONYMOUS_ID
    }
}
