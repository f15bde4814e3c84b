//! Who is making a change, for history attribution.

use serde::{Deserialize, Serialize};

/// Read-only view of the logged-in session.
pub trait SessionContext {
    fn current_user_name(&self) -> String;
    fn current_user_organisation(&self) -> String;
}

/// Actor attribution passed explicitly into history reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub user_name: String,
    pub user_organisation: String,
}

impl ActorContext {
    pub fn new(user_name: impl Into<String>, user_organisation: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_organisation: user_organisation.into(),
        }
    }

    /// Capture the session's current user once, so a reconciliation call sees
    /// a single consistent actor.
    pub fn from_session(session: &dyn SessionContext) -> Self {
        Self {
            user_name: session.current_user_name(),
            user_organisation: session.current_user_organisation(),
        }
    }
}

impl SessionContext for ActorContext {
    fn current_user_name(&self) -> String {
        self.user_name.clone()
    }

    fn current_user_organisation(&self) -> String {
        self.user_organisation.clone()
    }
}
