//! Explicit session context passed to every task operation, plus helpers for
//! resolving the session user from CLI parameters or the environment.

use std::env;

use anyhow::{Context, Result};
use tasklane_core::{Project, UserId};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::TaskError;

/// Environment variable checked first for the session user.
pub const ENV_USER: &str = "TASKLANE_USER";
/// Fallback user when nothing can be resolved.
pub const DEFAULT_USER: &str = "tasklane";

const USER_NAME_ENV: &str = "USER";

/// Authenticated user plus expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: UserId,
    expires_at: OffsetDateTime,
}

impl Session {
    /// Session for `user` valid until `expires_at`.
    #[must_use]
    pub const fn new(user: UserId, expires_at: OffsetDateTime) -> Self {
        Self { user, expires_at }
    }

    /// Session for `user` valid for `ttl` from now.
    ///
    /// Expiry saturates at the largest representable instant.
    #[must_use]
    pub fn with_ttl(user: UserId, ttl: Duration) -> Self {
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(ttl)
            .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc());
        Self::new(user, expires_at)
    }

    /// The authenticated user.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Expiry instant.
    #[must_use]
    pub const fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// Whether the session is still valid at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }

    /// Reject expired sessions.
    ///
    /// # Errors
    /// Returns [`TaskError::Unauthenticated`] once the session has expired.
    pub fn ensure_live(&self) -> Result<(), TaskError> {
        if self.is_live_at(OffsetDateTime::now_utc()) {
            Ok(())
        } else {
            Err(TaskError::Unauthenticated)
        }
    }

    /// Reject expired sessions and projects owned by someone else.
    ///
    /// # Errors
    /// Returns [`TaskError::Unauthenticated`] or [`TaskError::AccessDenied`].
    pub fn authorize(&self, project: &Project) -> Result<(), TaskError> {
        self.ensure_live()?;
        if project.owner == self.user {
            Ok(())
        } else {
            Err(TaskError::AccessDenied(project.id))
        }
    }
}

/// Resolve the session user: explicit parameter, then environment, then the default.
pub fn resolve_user(param: Option<&str>) -> UserId {
    let mut fetch = |key: &'static str| env::var(key).ok();
    resolve_user_with(param, &mut fetch)
}

fn resolve_user_with(param: Option<&str>, fetch: &mut impl FnMut(&'static str) -> Option<String>) -> UserId {
    param
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::from)
        .or_else(|| user_from_env_with(fetch).ok())
        .unwrap_or_else(|| UserId::from(DEFAULT_USER))
}

fn user_from_env_with(fetch: &mut impl FnMut(&'static str) -> Option<String>) -> Result<UserId> {
    [ENV_USER, USER_NAME_ENV]
        .iter()
        .find_map(|key| fetch(key).filter(|value| !value.trim().is_empty()))
        .map(|value| UserId::new(value.trim()))
        .context("environment does not include a session user")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklane_core::ProjectId;

    fn project_owned_by(owner: &str) -> Project {
        Project {
            id: ProjectId::new(),
            owner: UserId::from(owner),
            title: "p".into(),
            description: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
            tasks: Vec::new(),
        }
    }

    #[test]
    fn expired_session_is_unauthenticated() {
        let session = Session::new(UserId::from("alice"), OffsetDateTime::UNIX_EPOCH);
        assert!(matches!(session.ensure_live(), Err(TaskError::Unauthenticated)));
        assert!(matches!(
            session.authorize(&project_owned_by("alice")),
            Err(TaskError::Unauthenticated)
        ));
    }

    #[test]
    fn authorize_checks_owner() {
        let session = Session::with_ttl(UserId::from("alice"), Duration::minutes(5));
        assert!(session.authorize(&project_owned_by("alice")).is_ok());

        let foreign = project_owned_by("bob");
        assert!(matches!(
            session.authorize(&foreign),
            Err(TaskError::AccessDenied(id)) if id == foreign.id
        ));
    }

    #[test]
    fn oversized_ttl_saturates_instead_of_overflowing() {
        let session = Session::with_ttl(UserId::from("alice"), Duration::MAX);
        assert_eq!(session.expires_at(), PrimitiveDateTime::MAX.assume_utc());
        assert!(session.ensure_live().is_ok());
    }

    #[test]
    fn explicit_parameter_wins() {
        let mut fetch = |_: &'static str| Some("env-user".to_owned());
        let user = resolve_user_with(Some(" cli-user "), &mut fetch);
        assert_eq!(user.as_str(), "cli-user");
    }

    #[test]
    fn environment_prefers_tasklane_variable() -> Result<()> {
        let mut fetch = |key: &'static str| match key {
            ENV_USER => Some("tl-user".into()),
            USER_NAME_ENV => Some("login".into()),
            _ => None,
        };
        assert_eq!(user_from_env_with(&mut fetch)?.as_str(), "tl-user");

        let mut fetch = |key: &'static str| (key == USER_NAME_ENV).then(|| "login".to_owned());
        assert_eq!(user_from_env_with(&mut fetch)?.as_str(), "login");
        Ok(())
    }

    #[test]
    fn falls_back_to_default_user() {
        let mut fetch = |_: &'static str| Some("   ".to_owned());
        let user = resolve_user_with(Some(""), &mut fetch);
        assert_eq!(user.as_str(), DEFAULT_USER);
    }
}
