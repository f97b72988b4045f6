//! Actor entity

use crate::domain::shared::value_objects::ActorId;
use serde::{Deserialize, Serialize};

/// The operator currently signed in to the HR application.
///
/// Supplied by the identity provider and immutable for the lifetime of a
/// session attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// Management-class actors host every call they join
    #[serde(default)]
    pub is_management_class: bool,
}

impl Actor {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            display_name: display_name.into(),
            avatar_url: None,
            is_management_class: false,
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn management(mut self) -> Self {
        self.is_management_class = true;
        self
    }
}
