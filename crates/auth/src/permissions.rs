use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission identifier.
///
/// Permissions are flat named capabilities; there is no parent/child
/// relationship between them. [`Permission::Everything`] is stored like any
/// other flag and only acts as a wildcard when the resolver is configured to
/// honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Dashboard,
    Timesheets,
    Projects,
    Customers,
    Orders,
    Products,
    Materials,
    Employees,
    Approval,
    Reports,
    Everything,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::Dashboard,
        Permission::Timesheets,
        Permission::Projects,
        Permission::Customers,
        Permission::Orders,
        Permission::Products,
        Permission::Materials,
        Permission::Employees,
        Permission::Approval,
        Permission::Reports,
        Permission::Everything,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Dashboard => "dashboard",
            Permission::Timesheets => "timesheets",
            Permission::Projects => "projects",
            Permission::Customers => "customers",
            Permission::Orders => "orders",
            Permission::Products => "products",
            Permission::Materials => "materials",
            Permission::Employees => "employees",
            Permission::Approval => "approval",
            Permission::Reports => "reports",
            Permission::Everything => "everything",
        }
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Permission::Everything
    }
}

impl core::str::FromStr for Permission {
    type Err = UnknownPermission;

    /// Exact match on the wire vocabulary; permission keys are not case-folded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>(), Ok(p));
        }
    }

    #[test]
    fn rejects_unknown_and_miscased_names() {
        assert!("invoices".parse::<Permission>().is_err());
        assert!("Dashboard".parse::<Permission>().is_err());
    }
}
