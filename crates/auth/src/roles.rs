use serde::{Deserialize, Serialize};

/// Login type that promotes a session to [`Role::SuperAdmin`] regardless of
/// the role string stored on the user.
pub const SUPER_ADMIN_LOGIN_TYPE: &str = "super_admin";

/// Role identifier used for RBAC.
///
/// Known roles are explicit variants. Any other role string the backend
/// hands out is preserved as [`Role::Other`] so it can be displayed, but the
/// permission table has no entry for it and every check denies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    Administrator,
    Admin,
    Accountant,
    Trainer,
    Support,
    Other(String),
}

impl Role {
    /// All roles the application knows about.
    pub const KNOWN: [Role; 6] = [
        Role::SuperAdmin,
        Role::Administrator,
        Role::Admin,
        Role::Accountant,
        Role::Trainer,
        Role::Support,
    ];

    /// Parse a role string (trimmed, case-insensitive).
    pub fn parse(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        match normalized.as_str() {
            "super_admin" => Role::SuperAdmin,
            "administrator" => Role::Administrator,
            "admin" => Role::Admin,
            "accountant" => Role::Accountant,
            "trainer" => Role::Trainer,
            "support" => Role::Support,
            _ => Role::Other(normalized),
        }
    }

    /// Resolve the effective role of a session.
    ///
    /// Precedence: a `super_admin` login type wins over the literal role
    /// string; otherwise the role string is normalized. Returns `None` when
    /// neither yields a role (absent or blank role string).
    pub fn normalize(role: Option<&str>, login_type: Option<&str>) -> Option<Self> {
        if login_type.is_some_and(|t| t.trim().eq_ignore_ascii_case(SUPER_ADMIN_LOGIN_TYPE)) {
            return Some(Role::SuperAdmin);
        }

        role.filter(|r| !r.trim().is_empty()).map(Role::parse)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Administrator => "administrator",
            Role::Admin => "admin",
            Role::Accountant => "accountant",
            Role::Trainer => "trainer",
            Role::Support => "support",
            Role::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Other(_))
    }

    /// Roles with administrative reach (user management, review of others' work).
    pub fn is_admin_level(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Administrator | Role::Admin)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
