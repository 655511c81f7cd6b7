use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{
    cookie::{Cookie, Key, SameSite},
    PrivateCookieJar,
};

use crate::{error::AppError, models::new_id};

pub const USER_COOKIE: &str = "trip_user";
pub const USER_HEADER: &str = "x-trip-user";

/// Identity of the calling device. API clients send it in the `X-Trip-User`
/// header; browsers carry it in a private cookie minted on first visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<UserId>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserId>() {
            return Ok(Self(Some(user.clone())));
        }

        if let Some(raw) = parts.headers.get(USER_HEADER) {
            let id = raw
                .to_str()
                .ok()
                .map(str::trim)
                .filter(|id| is_valid_user_id(id))
                .ok_or_else(|| AppError::bad_request("Invalid X-Trip-User header"))?;
            return Ok(Self(Some(UserId(id.to_string()))));
        }

        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        Ok(Self(
            jar.get(USER_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|id| is_valid_user_id(id))
                .map(UserId),
        ))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&str, AppError> {
        self.0
            .as_ref()
            .map(|user| user.0.as_str())
            .ok_or(AppError::Unauthorized)
    }
}

pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

/// Returns the browser's user id, minting and storing a new one when absent.
pub fn ensure_identity(
    current: &CurrentUser,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, String) {
    if let Some(user) = &current.0 {
        return (jar, user.0.clone());
    }
    let user_id = new_id("user");
    let cookie = Cookie::build((USER_COOKIE, user_id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .permanent();
    (jar.add(cookie), user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_are_restricted_to_safe_characters() {
        assert!(is_valid_user_id("user_3f2a9c"));
        assert!(is_valid_user_id("device-42"));
        assert!(!is_valid_user_id(""));
        assert!(!is_valid_user_id("bob smith"));
        assert!(!is_valid_user_id(&"a".repeat(129)));
    }

    #[test]
    fn missing_identity_is_unauthorized() {
        assert!(matches!(
            CurrentUser::default().require_user(),
            Err(AppError::Unauthorized)
        ));
        let current = CurrentUser(Some(UserId("alice".into())));
        assert_eq!(current.require_user().unwrap(), "alice");
    }
}
