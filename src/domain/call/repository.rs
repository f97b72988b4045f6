//! Call directory and credential issuing interfaces

use crate::domain::call::value_object::{CallTarget, SessionCredential};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use crate::domain::user::Actor;
use async_trait::async_trait;

/// Lookup of the default call of the actor's organizational unit
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallDirectory: Send + Sync {
    async fn default_call_target(&self, actor: &Actor) -> Result<CallTarget>;
}

/// Token-issuing endpoint.
///
/// Authorization is left to the issuer; nothing is verified client-side
/// before asking for a credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, call_id: &CallId) -> Result<SessionCredential>;
}
