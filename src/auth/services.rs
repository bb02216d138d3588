use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{
    dto::{LoginRequest, RegisterRequest, UpdateProfileRequest},
    error::AuthError,
    jwt::JwtKeys,
    password::{
        hash_password, hash_password_blocking, is_long_enough, verify_password_blocking,
        MIN_PASSWORD_LEN,
    },
    repo::UserRepo,
    repo_types::{NewUser, Role, User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

lazy_static! {
    /// Verified against when the email is unknown, so both login failures cost one Argon2 verify.
    static ref DUMMY_HASH: String =
        hash_password("hiro-unknown-account").expect("argon2 hashes a fixed password");
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed value, `None` when absent or blank.
fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Passwords are taken verbatim; only emptiness counts as absent.
fn secret(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Creates an account. `allow_admin` decides whether a requested `admin` role is honoured;
/// when it is not, the account is created as a plain user.
pub async fn register(
    users: &dyn UserRepo,
    req: RegisterRequest,
    allow_admin: bool,
) -> Result<User, AuthError> {
    let (Some(name), Some(email), Some(password), Some(phone_number)) = (
        filled(req.name),
        filled(req.email),
        secret(req.password),
        filled(req.phone_number),
    ) else {
        return Err(AuthError::validation("All fields are required"));
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::validation("Invalid email format"));
    }

    if !is_long_enough(&password) {
        warn!("password too short");
        return Err(AuthError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AuthError::Conflict("Email already in use".into()));
    }

    let mut role = Role::from_request(req.role.as_deref());
    if role == Role::Admin && !allow_admin {
        warn!(email = %email, "admin signup disabled; registering as user");
        role = Role::User;
    }

    let password_hash = hash_password_blocking(password).await?;
    // A concurrent signup for the same email loses here with DuplicateEmail.
    let user = users
        .create(NewUser {
            name,
            email,
            password_hash,
            phone_number,
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user registered");
    Ok(user)
}

/// Verifies credentials and issues a session token.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<(String, User), AuthError> {
    let (Some(email), Some(password)) = (filled(req.email), secret(req.password)) else {
        return Err(AuthError::validation("Email and password required"));
    };
    let email = normalize_email(&email);

    let Some(user) = users.find_by_email(&email).await? else {
        verify_password_blocking(password, DUMMY_HASH.clone()).await?;
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = keys.sign(user.id, user.role)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((token, user))
}

pub async fn get_profile(users: &dyn UserRepo, user_id: Uuid) -> Result<User, AuthError> {
    users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "profile lookup for missing user");
        AuthError::NotFound
    })
}

/// Outcome of a profile update. `Unchanged` is a success, not an error.
#[derive(Debug)]
pub enum ProfileUpdate {
    Updated(User),
    Unchanged(User),
}

/// Applies the requested changes in memory, validates all of them, then writes once.
pub async fn update_profile(
    users: &dyn UserRepo,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<ProfileUpdate, AuthError> {
    let mut user = get_profile(users, user_id).await?;
    let mut changed = false;

    if let Some(name) = filled(req.name) {
        if name != user.name {
            user.name = name;
            changed = true;
        }
    }
    if let Some(phone_number) = filled(req.phone_number) {
        if phone_number != user.phone_number {
            user.phone_number = phone_number;
            changed = true;
        }
    }
    if let Some(address) = filled(req.address) {
        if user.address.as_deref() != Some(address.as_str()) {
            user.address = Some(address);
            changed = true;
        }
    }

    match (secret(req.current_password), secret(req.new_password)) {
        (None, None) => {}
        (Some(current), Some(new)) => {
            if !verify_password_blocking(current, user.password_hash.clone()).await? {
                warn!(user_id = %user_id, "password change with wrong current password");
                return Err(AuthError::IncorrectPassword);
            }
            if !is_long_enough(&new) {
                return Err(AuthError::validation(format!(
                    "New password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            if verify_password_blocking(new.clone(), user.password_hash.clone()).await? {
                return Err(AuthError::validation(
                    "New password cannot be the same as current password",
                ));
            }
            user.password_hash = hash_password_blocking(new).await?;
            changed = true;
        }
        _ => {
            return Err(AuthError::validation(
                "Both current and new passwords are required to change password",
            ));
        }
    }

    if !changed {
        return Ok(ProfileUpdate::Unchanged(user));
    }

    let saved = users.update(&user).await?.ok_or(AuthError::NotFound)?;
    info!(user_id = %user_id, "profile updated");
    Ok(ProfileUpdate::Updated(saved))
}
