use crate::model::User;
use uuid::Uuid;

/// Per-request state handed to every handler
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// The acting user; anonymous when nobody is logged in
    pub user: User,
}

impl RequestContext {
    pub fn new(user: User) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(User::anonymous())
    }
}
