//! Role → permission policy table.
//!
//! This is the only policy source on the client: changing who may see what
//! means changing [`RolePermissionTable::standard`].

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::Serialize;

use crate::{Permission, Role};

/// Resolved permission flags for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet {
    flags: BTreeMap<Permission, bool>,
}

static EMPTY: PermissionSet = PermissionSet {
    flags: BTreeMap::new(),
};

impl PermissionSet {
    /// Set with an explicit flag for every permission; `granted` ones are true.
    pub fn from_granted(granted: &[Permission]) -> Self {
        let flags = Permission::ALL
            .into_iter()
            .map(|p| (p, granted.contains(&p)))
            .collect();
        Self { flags }
    }

    /// Strict lookup: only an explicit `true` grants.
    pub fn get(&self, permission: Permission) -> bool {
        self.flags.get(&permission).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Permissions explicitly set to `true`, in declaration order.
    pub fn granted(&self) -> impl Iterator<Item = Permission> + '_ {
        self.flags.iter().filter(|(_, v)| **v).map(|(p, _)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Permission, bool)> + '_ {
        self.flags.iter().map(|(p, v)| (*p, *v))
    }
}

/// Immutable mapping from role to its permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionTable {
    roles: HashMap<Role, PermissionSet>,
}

static STANDARD: LazyLock<RolePermissionTable> = LazyLock::new(|| {
    use Permission::*;

    RolePermissionTable::builder()
        .role(Role::SuperAdmin, &Permission::ALL)
        .role(
            Role::Administrator,
            &[
                Dashboard, Timesheets, Projects, Customers, Orders, Products, Materials,
                Employees, Approval, Reports,
            ],
        )
        .role(
            Role::Admin,
            &[
                Dashboard, Timesheets, Projects, Customers, Orders, Products, Materials,
                Approval, Reports,
            ],
        )
        .role(
            Role::Accountant,
            &[Dashboard, Customers, Orders, Products, Reports],
        )
        .role(Role::Trainer, &[Timesheets, Projects])
        .role(Role::Support, &[Timesheets, Customers, Orders])
        .build()
});

impl RolePermissionTable {
    /// The application's policy, built once on first use.
    pub fn standard() -> &'static RolePermissionTable {
        &STANDARD
    }

    pub fn builder() -> RolePermissionTableBuilder {
        RolePermissionTableBuilder::default()
    }

    /// Permission set of a role; unknown roles get an empty (all-deny) set.
    pub fn lookup(&self, role: &Role) -> &PermissionSet {
        self.roles.get(role).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    /// Roles with an entry, sorted.
    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.keys().collect();
        roles.sort();
        roles
    }
}

#[derive(Debug, Default)]
pub struct RolePermissionTableBuilder {
    roles: HashMap<Role, PermissionSet>,
}

impl RolePermissionTableBuilder {
    /// Declare a role and the permissions it is granted; every other
    /// permission is recorded as an explicit `false`.
    pub fn role(mut self, role: Role, granted: &[Permission]) -> Self {
        self.roles.insert(role, PermissionSet::from_granted(granted));
        self
    }

    pub fn build(self) -> RolePermissionTable {
        RolePermissionTable { roles: self.roles }
    }
}
