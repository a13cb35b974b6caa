use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{Session, UserRole};

/// Body of `POST /api/user/register` and `POST /api/user/login`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 64, message = "Username and password are required"))]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "Username and password are required"))]
    pub password: String,
}

/// Public view of a session; the token and expiry stay server-side.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SessionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session: SessionInfo,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

impl From<&Session> for SessionInfo {
    fn from(s: &Session) -> Self {
        Self {
            username: Some(s.username.clone()),
            role: Some(s.role),
        }
    }
}
