//! Session credential resolution

use crate::domain::call::{CredentialIssuer, SessionCredential};
use crate::domain::shared::{CallId, InitializationError, ServiceError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Obtains the short-lived credential for a call. One request, no retry.
#[derive(Clone)]
pub struct CredentialResolver {
    issuer: Arc<dyn CredentialIssuer>,
}

impl CredentialResolver {
    pub fn new(issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self { issuer }
    }

    pub async fn resolve(&self, call_id: &CallId) -> Result<SessionCredential, InitializationError> {
        let credential = self.issuer.issue(call_id).await.map_err(|e| {
            warn!("Credential request for call {} failed: {}", call_id, e);
            InitializationError::credential(e)
        })?;

        if !credential.is_complete() {
            warn!("Credential for call {} is missing token or API key", call_id);
            return Err(InitializationError::credential(ServiceError::Malformed(
                "credential without token or API key".to_string(),
            )));
        }

        debug!("Issued credential for call {} to actor {}", call_id, credential.actor_id);
        Ok(credential)
    }
}
