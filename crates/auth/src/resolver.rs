//! Permission resolver: answers permission queries for the current session.
//!
//! Every query re-reads the injected [`SessionSource`]; nothing is cached, so
//! a logout is visible to the very next check.

use std::fmt;

use serde::Serialize;

use crate::session::{SessionSource, SessionUser};
use crate::table::{PermissionSet, RolePermissionTable};
use crate::{Permission, Role};

/// How the `everything` flag is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardPolicy {
    /// `everything` is an ordinary flag; other checks look only at their own key.
    #[default]
    Literal,
    /// A role holding `everything` is granted every permission.
    ImpliesAll,
}

/// Display bundle for header/greeting UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDisplayInfo {
    pub full_name: String,
    pub email: String,
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

pub struct PermissionResolver<'a> {
    session: &'a dyn SessionSource,
    table: &'a RolePermissionTable,
    wildcard: WildcardPolicy,
}

impl fmt::Debug for PermissionResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("table", &self.table)
            .field("wildcard", &self.wildcard)
            .finish_non_exhaustive()
    }
}

impl<'a> PermissionResolver<'a> {
    /// Resolver over the standard policy table.
    pub fn new(session: &'a dyn SessionSource) -> Self {
        Self::with_table(session, RolePermissionTable::standard())
    }

    pub fn with_table(session: &'a dyn SessionSource, table: &'a RolePermissionTable) -> Self {
        Self {
            session,
            table,
            wildcard: WildcardPolicy::default(),
        }
    }

    pub fn wildcard_policy(mut self, policy: WildcardPolicy) -> Self {
        self.wildcard = policy;
        self
    }

    pub fn table(&self) -> &RolePermissionTable {
        self.table
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.session.current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Normalized role of the current user (login-type override applied).
    pub fn user_role(&self) -> Option<Role> {
        self.current_user().and_then(|u| u.effective_role())
    }

    /// Strict check: true only if the role's set has an explicit `true`.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self.user_role() {
            Some(role) => self.role_has(&role, permission),
            None => false,
        }
    }

    /// String-keyed variant for callers holding raw permission names;
    /// unknown names deny.
    pub fn has_permission_named(&self, name: &str) -> bool {
        match name.parse::<Permission>() {
            Ok(permission) => self.has_permission(permission),
            Err(e) => {
                tracing::debug!(error = %e, "permission check on unknown name");
                false
            }
        }
    }

    /// Route-level check. Kept separate from [`Self::has_permission`] so page
    /// visibility can diverge from feature visibility later.
    pub fn can_access_page(&self, permission: Permission) -> bool {
        self.has_permission(permission)
    }

    /// Full permission set of the current role, empty when unauthenticated.
    pub fn user_permissions(&self) -> PermissionSet {
        match self.user_role() {
            Some(role) => self.effective_set(&role),
            None => PermissionSet::default(),
        }
    }

    pub fn is_admin_level(&self) -> bool {
        self.user_role().is_some_and(|r| r.is_admin_level())
    }

    pub fn is_super_admin(&self) -> bool {
        self.user_role() == Some(Role::SuperAdmin)
    }

    pub fn user_display_info(&self) -> Option<UserDisplayInfo> {
        let user = self.current_user()?;
        let role = user.effective_role();
        let permissions = match &role {
            Some(role) => self.effective_set(role),
            None => PermissionSet::default(),
        };

        Some(UserDisplayInfo {
            full_name: user.full_name(),
            email: user.email,
            role,
            permissions,
        })
    }

    pub(crate) fn role_has(&self, role: &Role, permission: Permission) -> bool {
        let set = self.table.lookup(role);
        if set.get(permission) {
            return true;
        }
        self.wildcard == WildcardPolicy::ImpliesAll && set.get(Permission::Everything)
    }

    fn effective_set(&self, role: &Role) -> PermissionSet {
        let set = self.table.lookup(role);
        if self.wildcard == WildcardPolicy::ImpliesAll && set.get(Permission::Everything) {
            PermissionSet::from_granted(&Permission::ALL)
        } else {
            set.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use bizops_core::UserId;
    use proptest::prelude::*;

    use super::*;
    use crate::session::{MemoryStorage, SessionStore};

    fn user(role: &str) -> Option<SessionUser> {
        Some(SessionUser::new(UserId::from(1), role).with_name("Alice", "Smith"))
    }

    #[test]
    fn debug_output_shows_policy_not_session() {
        let session = user("admin");
        let resolver = PermissionResolver::new(&session).wildcard_policy(WildcardPolicy::ImpliesAll);

        let rendered = format!("{resolver:?}");
        assert!(rendered.starts_with("PermissionResolver"));
        assert!(rendered.contains("ImpliesAll"));
        assert!(!rendered.contains("Alice"));
    }

    #[test]
    fn no_session_denies_everything() {
        let session: Option<SessionUser> = None;
        let resolver = PermissionResolver::new(&session);

        assert!(!resolver.is_authenticated());
        assert_eq!(resolver.user_role(), None);
        for p in Permission::ALL {
            assert!(!resolver.has_permission(p));
        }
        assert!(resolver.user_permissions().is_empty());
        assert_eq!(resolver.user_display_info(), None);
    }

    #[test]
    fn user_without_role_denies_everything() {
        let mut u = SessionUser::new(UserId::from(1), "");
        u.role = None;
        let session = Some(u);
        let resolver = PermissionResolver::new(&session);

        assert_eq!(resolver.user_role(), None);
        assert!(!resolver.has_permission(Permission::Timesheets));
    }

    #[test]
    fn accountant_scenario() {
        let session = user("Accountant");
        let resolver = PermissionResolver::new(&session);

        assert!(resolver.can_access_page(Permission::Dashboard));
        assert!(resolver.can_access_page(Permission::Customers));
        assert!(!resolver.can_access_page(Permission::Projects));
        assert!(!resolver.has_permission(Permission::Employees));
        assert!(!resolver.is_admin_level());
    }

    #[test]
    fn login_type_override_grants_super_admin() {
        let session = Some(
            SessionUser::new(UserId::from(1), "trainer").with_login_type("super_admin"),
        );
        let resolver = PermissionResolver::new(&session);

        assert!(resolver.is_super_admin());
        assert!(resolver.is_admin_level());
        assert!(resolver.has_permission(Permission::Employees));
    }

    #[test]
    fn unknown_permission_name_denies() {
        let session = user("super_admin");
        let resolver = PermissionResolver::new(&session);

        assert!(resolver.has_permission_named("dashboard"));
        assert!(!resolver.has_permission_named("invoices"));
        assert!(!resolver.has_permission_named(""));
    }

    #[test]
    fn literal_wildcard_is_not_a_short_circuit() {
        let table = RolePermissionTable::builder()
            .role(Role::Admin, &[Permission::Everything])
            .build();
        let session = user("admin");
        let resolver = PermissionResolver::with_table(&session, &table);

        assert!(resolver.has_permission(Permission::Everything));
        assert!(!resolver.has_permission(Permission::Orders));
        assert!(!resolver.user_permissions().get(Permission::Orders));
    }

    #[test]
    fn implied_wildcard_grants_everything() {
        let table = RolePermissionTable::builder()
            .role(Role::Admin, &[Permission::Everything])
            .build();
        let session = user("admin");
        let resolver = PermissionResolver::with_table(&session, &table)
            .wildcard_policy(WildcardPolicy::ImpliesAll);

        assert!(resolver.has_permission(Permission::Orders));
        assert!(resolver.user_permissions().get(Permission::Employees));
    }

    #[test]
    fn display_info_reflects_session() {
        let session = Some(
            SessionUser::new(UserId::from(1), "support")
                .with_name("Bo", "Li")
                .with_email("bo@example.com"),
        );
        let info = PermissionResolver::new(&session).user_display_info().unwrap();

        assert_eq!(info.full_name, "Bo Li");
        assert_eq!(info.email, "bo@example.com");
        assert_eq!(info.role, Some(Role::Support));
        assert!(info.permissions.get(Permission::Timesheets));
        assert!(!info.permissions.get(Permission::Dashboard));
    }

    #[test]
    fn resolver_sees_logout_immediately() {
        let store = SessionStore::new(MemoryStorage::new());
        store.save(&user("admin").unwrap(), Some("sid")).unwrap();
        let resolver = PermissionResolver::new(&store);

        assert!(resolver.has_permission(Permission::Orders));
        store.clear().unwrap();
        assert!(!resolver.has_permission(Permission::Orders));
    }

    proptest! {
        #[test]
        fn unlisted_roles_fail_closed(name in "[a-z_]{1,16}") {
            let role = Role::parse(&name);
            prop_assume!(!role.is_known());

            let session = user(&name);
            for policy in [WildcardPolicy::Literal, WildcardPolicy::ImpliesAll] {
                let resolver = PermissionResolver::new(&session).wildcard_policy(policy);
                for p in Permission::ALL {
                    prop_assert!(!resolver.has_permission(p));
                }
            }
        }
    }
}
