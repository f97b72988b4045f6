//! Call target resolution

use crate::domain::call::{CallDirectory, CallTarget};
use crate::domain::shared::{CallId, InitializationError};
use crate::domain::user::Actor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides which call a session attempt joins
#[derive(Clone)]
pub struct CallTargetResolver {
    directory: Arc<dyn CallDirectory>,
}

impl CallTargetResolver {
    pub fn new(directory: Arc<dyn CallDirectory>) -> Self {
        Self { directory }
    }

    /// Explicit id wins and costs no lookup; otherwise ask the directory for
    /// the actor's department call. Failures are not retried.
    pub async fn resolve(
        &self,
        explicit_call_id: Option<&CallId>,
        actor: &Actor,
    ) -> Result<CallTarget, InitializationError> {
        if let Some(call_id) = explicit_call_id {
            debug!("Using explicit call target {}", call_id);
            return Ok(CallTarget::explicit(call_id.clone()));
        }

        match self.directory.default_call_target(actor).await {
            Ok(target) => {
                debug!(
                    "Resolved department call {} for actor {} (department {})",
                    target.call_id, actor.id, target.department_id
                );
                Ok(target)
            }
            Err(e) => {
                warn!("Failed to resolve default call for actor {}: {}", actor.id, e);
                Err(InitializationError::target_resolution(e))
            }
        }
    }
}
