//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RecoveryRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionResponse {
    pub email: String,
    pub display_name: String,
    pub capability: String,
    pub is_technician: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn missing_fields_default_to_empty() -> Result<()> {
        let request: LoginRequest = serde_json::from_str(r#"{"email":"a@x.com"}"#)?;
        assert_eq!(request.email, "a@x.com");
        assert!(request.password.is_empty());
        Ok(())
    }
}
