//! Wire shapes of the REST backend

use crate::domain::call::{CallTarget, SessionCredential};
use crate::domain::meeting::{MeetingRecord, MeetingStatus};
use crate::domain::shared::{ActorId, CallId, DepartmentId, MeetingId, ServiceError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTargetDto {
    pub call_id: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub department_name: Option<String>,
}

impl TryFrom<CallTargetDto> for CallTarget {
    type Error = ServiceError;

    fn try_from(dto: CallTargetDto) -> Result<Self, Self::Error> {
        let call_id = CallId::parse_optional(Some(&dto.call_id))
            .ok_or_else(|| ServiceError::Malformed("empty callId".to_string()))?;
        Ok(CallTarget {
            call_id,
            department_id: DepartmentId::new(dto.department_id.unwrap_or(0)),
            department_name: dto.department_name,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDto {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub api_key: String,
    pub user_id: i64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_image: Option<String>,
}

impl From<CredentialDto> for SessionCredential {
    fn from(dto: CredentialDto) -> Self {
        SessionCredential {
            token: dto.token,
            client_api_key: dto.api_key,
            actor_id: ActorId::new(dto.user_id),
            actor_display_name: dto.user_name,
            actor_image: dto.user_image,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDto {
    pub id: String,
    pub created_by_id: i64,
    pub status: String,
}

impl TryFrom<MeetingDto> for MeetingRecord {
    type Error = ServiceError;

    fn try_from(dto: MeetingDto) -> Result<Self, Self::Error> {
        let status: MeetingStatus = dto.status.parse()?;
        Ok(MeetingRecord::new(
            MeetingId::new(dto.id),
            ActorId::new(dto.created_by_id),
            status,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateDto<'a> {
    pub status: &'a str,
}

/// `{"message": "..."}` error body
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

impl ErrorBody {
    /// Message from a raw error body; blank or unparsable bodies yield none
    pub fn extract(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}
