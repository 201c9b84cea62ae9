// Role Gate
// Equality-based role checks; no hierarchy between roles

use crate::errors::{ErrorCategory, ErrorCode, ErrorSeverity, HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. ADMIN is not automatically granted USER or COMPLIANCE
/// permissions; each caller declares its own allowed set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
    Compliance,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Compliance => "COMPLIANCE",
        }
    }

    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Compliance];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            "COMPLIANCE" => Ok(Role::Compliance),
            other => Err(HubError::new(
                ErrorCode::Validation,
                ErrorCategory::Validation,
                ErrorSeverity::Medium,
                &format!("Unknown role: {}", other),
            )),
        }
    }
}

/// Identity of the current session, handed in by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

pub fn is_allowed(role: Role, allowed_roles: &[Role]) -> bool {
    allowed_roles.contains(&role)
}

/// Halts with a "login required" error when there is no authenticated session.
pub fn require_auth(session: Option<&SessionContext>) -> HubResult<&SessionContext> {
    session.ok_or_else(|| {
        HubError::new(
            ErrorCode::AuthenticationRequired,
            ErrorCategory::Security,
            ErrorSeverity::Medium,
            "You need to log in to access this page",
        )
    })
}

/// Halts with an "access denied" error unless the session's role is in the
/// allowed set.
pub fn require_roles<'a>(
    session: Option<&'a SessionContext>,
    allowed_roles: &[Role],
) -> HubResult<&'a SessionContext> {
    let session = require_auth(session)?;
    if !is_allowed(session.role, allowed_roles) {
        return Err(HubError::new(
            ErrorCode::PermissionDenied,
            ErrorCategory::Security,
            ErrorSeverity::Medium,
            "Access denied for your profile",
        ));
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> SessionContext {
        SessionContext {
            user_id: 1,
            email: "someone@company.com".to_string(),
            role,
        }
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn unauthenticated_sessions_are_halted() {
        let err = require_auth(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticationRequired);
    }

    #[test]
    fn admin_is_not_implicitly_allowed() {
        let admin = session(Role::Admin);
        let err = require_roles(Some(&admin), &[Role::Compliance]).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        assert!(require_roles(Some(&admin), &[Role::Compliance, Role::Admin]).is_ok());
    }
}
