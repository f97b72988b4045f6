//! Call screen variants
//!
//! The UI layer mounts one of three call screens. Each maps its raw route
//! parameters onto a [`CoordinatorOptions`] preset.

use crate::application::{CallCoordinator, CallServices, CoordinatorOptions};
use crate::domain::shared::{CallId, MeetingId};
use crate::domain::user::Actor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallScreenKind {
    Generic,
    Employee,
    Management,
}

/// Raw route parameters as the router hands them over
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteParams {
    pub call_id: Option<String>,
    pub meeting_id: Option<String>,
}

impl CallScreenKind {
    /// Blank parameters count as absent. The employee screen ignores any
    /// call id and always joins the department's default call.
    pub fn options(&self, params: &RouteParams) -> CoordinatorOptions {
        let call_id = CallId::parse_optional(params.call_id.as_deref());
        let meeting_id = MeetingId::parse_optional(params.meeting_id.as_deref());

        match self {
            CallScreenKind::Generic => CoordinatorOptions::generic(call_id, meeting_id),
            CallScreenKind::Employee => CoordinatorOptions::employee(meeting_id),
            CallScreenKind::Management => CoordinatorOptions::management(call_id, meeting_id),
        }
    }

    /// Coordinator for a freshly mounted screen
    pub fn mount(&self, services: CallServices, params: &RouteParams, actor: Actor) -> CallCoordinator {
        CallCoordinator::new(services, self.options(params), actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(call_id: Option<&str>, meeting_id: Option<&str>) -> RouteParams {
        RouteParams {
            call_id: call_id.map(str::to_string),
            meeting_id: meeting_id.map(str::to_string),
        }
    }

    #[test]
    fn test_generic_screen_keeps_call_id() {
        let options = CallScreenKind::Generic.options(&params(Some("room-42"), Some("m1")));
        assert_eq!(options.explicit_call_id, Some(CallId::new("room-42")));
        assert_eq!(options.meeting_id, Some(MeetingId::new("m1")));
        assert!(!options.always_host);
    }

    #[test]
    fn test_blank_params_are_absent() {
        let options = CallScreenKind::Generic.options(&params(Some("  "), Some("")));
        assert!(options.explicit_call_id.is_none());
        assert!(options.meeting_id.is_none());
    }

    #[test]
    fn test_employee_and_management_presets() {
        let employee = CallScreenKind::Employee.options(&params(Some("room-42"), None));
        assert!(employee.explicit_call_id.is_none());

        let management = CallScreenKind::Management.options(&params(None, Some("m1")));
        assert!(management.always_host);
        assert_eq!(management.meeting_id, Some(MeetingId::new("m1")));
    }

    #[test]
    fn test_route_params_from_json() {
        let params: RouteParams = serde_json::from_str(r#"{"callId":"c-1"}"#).unwrap();
        assert_eq!(params.call_id.as_deref(), Some("c-1"));
        assert!(params.meeting_id.is_none());
    }
}
