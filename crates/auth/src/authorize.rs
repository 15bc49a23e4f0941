use serde::Serialize;
use thiserror::Error;

use crate::resolver::PermissionResolver;
use crate::routes::AppRoute;
use crate::{Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("forbidden: role '{role}' is missing permission '{permission}'")]
    Forbidden { permission: Permission, role: String },
}

/// Authorize the current session for a page-level permission.
///
/// - No IO beyond reading the session source
/// - No panics
pub fn authorize(
    resolver: &PermissionResolver<'_>,
    required: Permission,
) -> Result<(), AuthzError> {
    let Some(user) = resolver.current_user() else {
        return Err(AuthzError::Unauthenticated);
    };

    if resolver.can_access_page(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            permission: required,
            role: role_label(user.effective_role().as_ref()),
        })
    }
}

/// Role as shown to users; sessions without a role read as "none".
pub fn role_label(role: Option<&Role>) -> String {
    role.map(|r| r.as_str().to_string())
        .unwrap_or_else(|| "none".to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// The permission that was being checked.
    pub required_permission: Permission,

    /// Whether the authorization was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Effective role of the session, if any.
    pub role: Option<Role>,

    /// Permissions granted to that role (sorted).
    pub effective_permissions: Vec<Permission>,

    /// If denied, this explains what was missing.
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    UnknownRole,
    MissingPermission,
}

/// Explain why an authorization decision was made (or would be made).
///
/// Answers "why was this page hidden?" for support and debug output. The
/// decision itself always agrees with [`authorize`].
pub fn explain_authorization(
    resolver: &PermissionResolver<'_>,
    required: Permission,
) -> AuthorizationExplanation {
    let Some(user) = resolver.current_user() else {
        return AuthorizationExplanation {
            required_permission: required,
            granted: false,
            reason: "No user is logged in".to_string(),
            role: None,
            effective_permissions: Vec::new(),
            denial_reason: Some(DenialReason {
                kind: DenialKind::Unauthenticated,
                message: "The session is missing or could not be read".to_string(),
                suggestions: vec![format!("Log in via {}", AppRoute::Login.path())],
            }),
        };
    };

    let role = user.effective_role();
    let effective_permissions: Vec<Permission> = resolver.user_permissions().granted().collect();

    if resolver.can_access_page(required) {
        return AuthorizationExplanation {
            required_permission: required,
            granted: true,
            reason: format!(
                "Role '{}' grants permission '{}'",
                role_label(role.as_ref()),
                required
            ),
            role,
            effective_permissions,
            denial_reason: None,
        };
    }

    let denial_reason = match &role {
        Some(r) if !resolver.table().contains(r) => DenialReason {
            kind: DenialKind::UnknownRole,
            message: format!("Role '{r}' has no entry in the permission table"),
            suggestions: vec![
                "Check the role string issued by the backend".to_string(),
                "Add the role to the permission table if it is new".to_string(),
            ],
        },
        _ => {
            let granting: Vec<&Role> = resolver
                .table()
                .roles()
                .into_iter()
                .filter(|r| resolver.table().lookup(r).get(required))
                .collect();

            let mut suggestions = vec![format!(
                "Ask an administrator for a role that grants '{required}'"
            )];
            if !granting.is_empty() {
                let names: Vec<&str> = granting.iter().map(|r| r.as_str()).collect();
                suggestions.push(format!("Roles granting '{required}': {}", names.join(", ")));
            }

            DenialReason {
                kind: DenialKind::MissingPermission,
                message: format!("Missing required permission: '{required}'"),
                suggestions,
            }
        }
    };

    AuthorizationExplanation {
        required_permission: required,
        granted: false,
        reason: format!(
            "Role '{}' does not grant permission '{}'",
            role_label(role.as_ref()),
            required
        ),
        role,
        effective_permissions,
        denial_reason: Some(denial_reason),
    }
}
