use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};

/// Request body for user registration. Fields are optional so that a missing field is
/// reported as a validation error rather than a deserialisation failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update. Password change needs both password fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub message: &'static str,
    pub updated: bool,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            address: user.address.clone(),
            role: user.role,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            address: user.address,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serialises_camel_case_without_hash() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@x.com".into(),
            phone_number: "0700000000".into(),
            address: None,
            role: Role::User,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["phoneNumber"], "0700000000");
        assert_eq!(json["role"], "user");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn row_to_response_drops_password_hash() {
        let now = time::OffsetDateTime::now_utc();
        let row = User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
            phone_number: "0700000000".into(),
            address: Some("Nairobi".into()),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        let body = serde_json::to_string(&PublicUser::from(&row)).unwrap();
        assert!(!body.contains("argon2"));
        assert!(body.contains("Nairobi"));
        assert!(body.contains("\"role\":\"admin\""));
    }

    #[test]
    fn register_request_reads_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@b.co","password":"p","phoneNumber":"07","role":"Admin"}"#,
        )
        .unwrap();
        assert_eq!(req.phone_number.as_deref(), Some("07"));
        assert_eq!(req.role.as_deref(), Some("Admin"));
    }
}
