use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, RegisterRequest, UserUpdateRequest};
use super::repo_types::{NewUser, User, UserChanges};
use crate::{
    auth::{
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::{AppError, AppResult, FieldErrors},
    state::AppState,
    validation::{check_max_len, check_text, is_valid_email, require},
};

const LOGIN_FAILED: &str = "Unable to log in with provided credentials.";

/// Freshly issued access/refresh pair.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_age(errors: &mut FieldErrors, age: i32) {
    if age < 0 {
        errors.add("age", "Ensure this value is greater than or equal to 0.");
    }
}

/// Rejects a username/email already held by someone other than `owner`.
async fn ensure_unique(
    st: &AppState,
    username: Option<&str>,
    email: Option<&str>,
    owner: Option<Uuid>,
) -> AppResult<()> {
    if let Some(username) = username {
        if let Some(existing) = st.users.find_by_username(username).await? {
            if Some(existing.id) != owner {
                return Err(AppError::Conflict(
                    "A user with that username already exists.".into(),
                ));
            }
        }
    }
    if let Some(email) = email {
        if let Some(existing) = st.users.find_by_email(email).await? {
            if Some(existing.id) != owner {
                return Err(AppError::Conflict(
                    "A user with that email address already exists.".into(),
                ));
            }
        }
    }
    Ok(())
}

pub async fn register(st: &AppState, req: RegisterRequest, is_admin: bool) -> AppResult<User> {
    let mut errors = FieldErrors::default();
    let username = require(&mut errors, "username", &req.username).map(|s| s.trim().to_string());
    let full_name = require(&mut errors, "full_name", &req.full_name).map(|s| s.trim().to_string());
    let email = require(&mut errors, "email", &req.email).map(|s| normalize_email(s));
    let age = require(&mut errors, "age", &req.age).copied();
    let password = require(&mut errors, "password", &req.password);

    if let Some(username) = &username {
        check_text(&mut errors, "username", username, 150);
    }
    if let Some(full_name) = &full_name {
        check_text(&mut errors, "full_name", full_name, 100);
    }
    if let Some(email) = &email {
        check_email(&mut errors, email);
    }
    if let Some(age) = age {
        check_age(&mut errors, age);
    }
    if let Some(phone) = &req.phone_number {
        check_max_len(&mut errors, "phone_number", phone, 15);
    }
    if let Some(password) = password {
        if password.len() < 8 {
            errors.add("password", "Password too short");
        }
    }
    if !errors.is_empty() {
        warn!(?errors, "registration rejected");
    }
    errors.into_result()?;

    let (Some(username), Some(full_name), Some(email), Some(password)) =
        (username, full_name, email, password)
    else {
        return Err(AppError::validation("Invalid input."));
    };

    ensure_unique(st, Some(&username), Some(&email), None).await?;

    let password_hash = hash_password(password)?;
    let user = st
        .users
        .create(NewUser {
            username,
            full_name,
            email,
            age,
            phone_number: req.phone_number,
            address: req.address,
            is_admin,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn login(st: &AppState, req: LoginRequest) -> AppResult<Session> {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return Err(AppError::validation(
            "Must include \"username\" and \"password\".",
        ));
    };

    let Some(user) = st.users.find_by_username(username.trim()).await? else {
        warn!(%username, "login unknown username");
        return Err(AppError::AuthenticationFailed(LOGIN_FAILED.into()));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::AuthenticationFailed(LOGIN_FAILED.into()));
    }

    let keys = JwtKeys::from(&st.config.jwt);
    let access = keys.sign_access(user.id)?;
    let refresh = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Session {
        user,
        access,
        refresh,
    })
}

/// Issues a new access token for a valid, non-revoked refresh token.
pub async fn refresh(st: &AppState, refresh_token: Option<String>) -> AppResult<String> {
    let Some(token) = refresh_token else {
        return Err(AppError::AuthenticationFailed(
            "No refresh token provided".into(),
        ));
    };
    let invalid = || AppError::AuthenticationFailed("Invalid refresh token".into());

    let keys = JwtKeys::from(&st.config.jwt);
    let claims = keys.verify_refresh(&token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        invalid()
    })?;
    if st.tokens.is_revoked(claims.jti).await? {
        warn!(user_id = %claims.sub, "blacklisted refresh token used");
        return Err(invalid());
    }
    if st.users.find_by_id(claims.sub).await?.is_none() {
        return Err(invalid());
    }

    Ok(keys.sign_access(claims.sub)?)
}

/// Blacklists the refresh token so it can no longer mint access tokens.
pub async fn logout(st: &AppState, refresh_token: Option<String>) -> AppResult<()> {
    let invalid = || AppError::field("refresh", "Invalid or expired refresh token.");
    let token = refresh_token.ok_or_else(invalid)?;

    let keys = JwtKeys::from(&st.config.jwt);
    let claims = keys.verify_refresh(&token).map_err(|_| invalid())?;
    if st.tokens.is_revoked(claims.jti).await? {
        return Err(invalid());
    }
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp as i64)
        .map_err(|e| AppError::Internal(e.into()))?;
    st.tokens.revoke(claims.jti, claims.sub, expires_at).await?;

    info!(user_id = %claims.sub, "user logged out");
    Ok(())
}

pub async fn current_user(st: &AppState, user_id: Uuid) -> AppResult<User> {
    st.users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::AuthenticationFailed("User not found".into()))
}

fn validate_changes(req: UserUpdateRequest) -> AppResult<UserChanges> {
    let mut errors = FieldErrors::default();
    let changes = UserChanges {
        username: req.username.map(|s| s.trim().to_string()),
        full_name: req.full_name.map(|s| s.trim().to_string()),
        email: req.email.map(|s| normalize_email(&s)),
        age: req.age,
        phone_number: req.phone_number,
        address: req.address,
    };
    if let Some(username) = &changes.username {
        check_text(&mut errors, "username", username, 150);
    }
    if let Some(full_name) = &changes.full_name {
        check_text(&mut errors, "full_name", full_name, 100);
    }
    if let Some(email) = &changes.email {
        check_email(&mut errors, email);
    }
    if let Some(age) = changes.age {
        check_age(&mut errors, age);
    }
    if let Some(phone) = &changes.phone_number {
        check_max_len(&mut errors, "phone_number", phone, 15);
    }
    errors.into_result()?;
    Ok(changes)
}

async fn apply_update(st: &AppState, target: Uuid, req: UserUpdateRequest) -> AppResult<User> {
    let changes = validate_changes(req)?;
    ensure_unique(
        st,
        changes.username.as_deref(),
        changes.email.as_deref(),
        Some(target),
    )
    .await?;
    let user = st.users.update(target, &changes).await?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

pub async fn update_profile(st: &AppState, user_id: Uuid, req: UserUpdateRequest) -> AppResult<User> {
    current_user(st, user_id).await?;
    apply_update(st, user_id, req).await
}

/// Loads the acting user and checks the admin flag.
pub async fn require_admin(st: &AppState, user_id: Uuid) -> AppResult<User> {
    let user = current_user(st, user_id).await?;
    if !user.is_admin {
        warn!(%user_id, "non-admin attempted user management");
        return Err(AppError::PermissionDenied(
            "You do not have permission to perform this action.".into(),
        ));
    }
    Ok(user)
}

pub async fn admin_list(st: &AppState, actor: Uuid) -> AppResult<Vec<User>> {
    require_admin(st, actor).await?;
    st.users.list().await
}

pub async fn admin_create(st: &AppState, actor: Uuid, req: RegisterRequest) -> AppResult<User> {
    require_admin(st, actor).await?;
    register(st, req, false).await
}

pub async fn admin_update(
    st: &AppState,
    actor: Uuid,
    target: Option<Uuid>,
    req: UserUpdateRequest,
) -> AppResult<User> {
    require_admin(st, actor).await?;
    let target = target.ok_or_else(|| AppError::validation("User ID is required"))?;
    let user = st
        .users
        .find_by_id(target)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if user.id == actor {
        return Err(AppError::validation(
            "Cannot update your own account through this endpoint",
        ));
    }
    apply_update(st, user.id, req).await
}

pub async fn admin_delete(st: &AppState, actor: Uuid, target: Option<Uuid>) -> AppResult<()> {
    require_admin(st, actor).await?;
    let target = target.ok_or_else(|| AppError::validation("User ID is required"))?;
    let user = st
        .users
        .find_by_id(target)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if user.id == actor {
        return Err(AppError::validation("Cannot delete your own account"));
    }
    st.users.delete(user.id).await?;
    info!(user_id = %user.id, deleted_by = %actor, "user deleted");
    Ok(())
}
