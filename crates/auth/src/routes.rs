//! Application routes and the per-role landing route.

use serde::Serialize;

use crate::resolver::PermissionResolver;
use crate::{Permission, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRoute {
    Login,
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
}

impl AppRoute {
    pub const ALL: [AppRoute; 11] = [
        AppRoute::Login,
        AppRoute::Dashboard,
        AppRoute::Timesheets,
        AppRoute::Projects,
        AppRoute::Customers,
        AppRoute::Orders,
        AppRoute::Products,
        AppRoute::Materials,
        AppRoute::Employees,
        AppRoute::Approval,
        AppRoute::Reports,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            AppRoute::Login => "/login",
            AppRoute::Dashboard => "/dashboard",
            AppRoute::Timesheets => "/timesheets",
            AppRoute::Projects => "/projects",
            AppRoute::Customers => "/customers",
            AppRoute::Orders => "/orders",
            AppRoute::Products => "/products",
            AppRoute::Materials => "/materials",
            AppRoute::Employees => "/employees",
            AppRoute::Approval => "/approval",
            AppRoute::Reports => "/reports",
        }
    }

    /// Permission a user needs to open this route; `None` for public routes.
    pub fn required_permission(&self) -> Option<Permission> {
        match self {
            AppRoute::Login => None,
            AppRoute::Dashboard => Some(Permission::Dashboard),
            AppRoute::Timesheets => Some(Permission::Timesheets),
            AppRoute::Projects => Some(Permission::Projects),
            AppRoute::Customers => Some(Permission::Customers),
            AppRoute::Orders => Some(Permission::Orders),
            AppRoute::Products => Some(Permission::Products),
            AppRoute::Materials => Some(Permission::Materials),
            AppRoute::Employees => Some(Permission::Employees),
            AppRoute::Approval => Some(Permission::Approval),
            AppRoute::Reports => Some(Permission::Reports),
        }
    }

    /// Authentication pages (no session watcher runs there).
    pub fn is_auth_page(&self) -> bool {
        matches!(self, AppRoute::Login)
    }

    /// Routes that must be wrapped by the route guard.
    pub fn protected() -> impl Iterator<Item = (AppRoute, Permission)> {
        AppRoute::ALL
            .into_iter()
            .filter_map(|r| r.required_permission().map(|p| (r, p)))
    }

    pub fn from_path(path: &str) -> Option<AppRoute> {
        let trimmed = path.trim_end_matches('/');
        AppRoute::ALL.into_iter().find(|r| r.path() == trimmed)
    }
}

impl core::fmt::Display for AppRoute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.path())
    }
}

/// Landing route for a role.
///
/// Roles without a dashboard (and unknown or absent roles) land on the
/// timesheet page, the lowest-privilege page in the app.
pub fn default_route_for(role: Option<&Role>) -> AppRoute {
    match role {
        Some(Role::SuperAdmin | Role::Administrator | Role::Admin | Role::Accountant) => {
            AppRoute::Dashboard
        }
        Some(Role::Trainer | Role::Support) => AppRoute::Timesheets,
        Some(Role::Other(_)) | None => AppRoute::Timesheets,
    }
}

impl PermissionResolver<'_> {
    /// Landing route for the current session.
    pub fn default_route(&self) -> AppRoute {
        default_route_for(self.user_role().as_ref())
    }
}
