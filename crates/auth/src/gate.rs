//! Generic permission gate: show or hide a piece of UI.
//!
//! The gate is view-agnostic. Callers pass a closure producing the guarded
//! view and an optional fallback; the gate returns whichever applies.

use crate::Permission;
use crate::resolver::PermissionResolver;

/// What a gate requires of the current role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequirement {
    /// No usable requirement was given; always denies.
    Unspecified,
    Single(Permission),
    /// Every listed permission must be granted. An empty list denies.
    All(Vec<Permission>),
    /// At least one listed permission must be granted.
    Any(Vec<Permission>),
}

impl PermissionRequirement {
    /// Build a requirement from component-style props.
    ///
    /// A list needs `require_all` or `require_any`; `require_all` wins when
    /// both are set. A list without either flag, even a one-element list, is
    /// unspecified and denies. Use [`PermissionGate::new`] for a lone
    /// permission.
    pub fn from_props(permissions: &[Permission], require_all: bool, require_any: bool) -> Self {
        match (permissions, require_all, require_any) {
            ([], _, _) => PermissionRequirement::Unspecified,
            (list, true, _) => PermissionRequirement::All(list.to_vec()),
            (list, false, true) => PermissionRequirement::Any(list.to_vec()),
            (_, false, false) => PermissionRequirement::Unspecified,
        }
    }

    pub fn is_satisfied(&self, resolver: &PermissionResolver<'_>) -> bool {
        match self {
            PermissionRequirement::Unspecified => false,
            PermissionRequirement::Single(p) => resolver.has_permission(*p),
            PermissionRequirement::All(list) => {
                !list.is_empty() && list.iter().all(|p| resolver.has_permission(*p))
            }
            PermissionRequirement::Any(list) => list.iter().any(|p| resolver.has_permission(*p)),
        }
    }
}

impl From<Permission> for PermissionRequirement {
    fn from(value: Permission) -> Self {
        PermissionRequirement::Single(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGate {
    requirement: PermissionRequirement,
}

impl PermissionGate {
    pub fn new(requirement: impl Into<PermissionRequirement>) -> Self {
        Self {
            requirement: requirement.into(),
        }
    }

    pub fn all(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(PermissionRequirement::All(permissions.into_iter().collect()))
    }

    pub fn any(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(PermissionRequirement::Any(permissions.into_iter().collect()))
    }

    pub fn requirement(&self) -> &PermissionRequirement {
        &self.requirement
    }

    /// Evaluated against the live session on every call.
    pub fn allows(&self, resolver: &PermissionResolver<'_>) -> bool {
        self.requirement.is_satisfied(resolver)
    }

    /// `children()` when allowed, otherwise `fallback`.
    pub fn render<V>(
        &self,
        resolver: &PermissionResolver<'_>,
        children: impl FnOnce() -> V,
        fallback: Option<V>,
    ) -> Option<V> {
        if self.allows(resolver) {
            Some(children())
        } else {
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use bizops_core::UserId;
    use proptest::prelude::*;

    use super::*;
    use crate::Role;
    use crate::session::SessionUser;

    fn session(role: &str) -> Option<SessionUser> {
        Some(SessionUser::new(UserId::from(1), role))
    }

    #[test]
    fn single_permission_renders_children_or_fallback() {
        let s = session("accountant");
        let resolver = PermissionResolver::new(&s);

        let shown = PermissionGate::new(Permission::Orders).render(&resolver, || "orders", None);
        assert_eq!(shown, Some("orders"));

        let hidden = PermissionGate::new(Permission::Employees).render(
            &resolver,
            || "Add Employee",
            Some("no access"),
        );
        assert_eq!(hidden, Some("no access"));
    }

    #[test]
    fn add_employee_button_hidden_for_accountant() {
        let s = session("accountant");
        let resolver = PermissionResolver::new(&s);
        let rendered =
            PermissionGate::new(Permission::Employees).render(&resolver, || "Add Employee", None);
        assert_eq!(rendered, None);
    }

    #[test]
    fn require_all_and_any_with_mixed_grants() {
        // accountant: dashboard granted, projects not
        let s = session("accountant");
        let resolver = PermissionResolver::new(&s);
        let mixed = [Permission::Dashboard, Permission::Projects];

        let all = PermissionGate::new(PermissionRequirement::from_props(&mixed, true, false));
        assert_eq!(
            all.render(&resolver, || "children", Some("fallback")),
            Some("fallback")
        );

        let any = PermissionGate::new(PermissionRequirement::from_props(&mixed, false, true));
        assert_eq!(
            any.render(&resolver, || "children", Some("fallback")),
            Some("children")
        );
    }

    #[test]
    fn list_without_mode_denies() {
        let s = session("super_admin");
        let resolver = PermissionResolver::new(&s);
        let pair = [Permission::Dashboard, Permission::Orders];
        let req = PermissionRequirement::from_props(&pair, false, false);
        assert_eq!(req, PermissionRequirement::Unspecified);
        assert!(!PermissionGate::new(req).allows(&resolver));

        let lone = PermissionRequirement::from_props(&[Permission::Dashboard], false, false);
        assert_eq!(lone, PermissionRequirement::Unspecified);
        assert_eq!(
            PermissionGate::new(lone).render(&resolver, || "children", Some("fallback")),
            Some("fallback")
        );
    }

    #[test]
    fn empty_requirements_deny() {
        let s = session("super_admin");
        let resolver = PermissionResolver::new(&s);

        let empty_all = PermissionRequirement::from_props(&[], true, false);
        assert!(!PermissionGate::new(empty_all).allows(&resolver));
        assert!(!PermissionGate::all([]).allows(&resolver));
        assert!(!PermissionGate::any([]).allows(&resolver));
    }

    #[test]
    fn require_all_wins_when_both_flags_set() {
        let req = PermissionRequirement::from_props(&[Permission::Orders], true, true);
        assert_eq!(req, PermissionRequirement::All(vec![Permission::Orders]));
    }

    #[test]
    fn gate_without_session_renders_fallback() {
        let s: Option<SessionUser> = None;
        let resolver = PermissionResolver::new(&s);
        assert_eq!(
            PermissionGate::any(Permission::ALL).render(&resolver, || 1, Some(0)),
            Some(0)
        );
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            proptest::sample::select(Role::KNOWN.to_vec()),
            "[a-z]{1,8}".prop_map(|s| Role::parse(&s)),
        ]
    }

    proptest! {
        #[test]
        fn single_matches_require_all_of_one(
            role in any_role(),
            permission in proptest::sample::select(Permission::ALL.to_vec()),
        ) {
            let s = session(role.as_str());
            let resolver = PermissionResolver::new(&s);

            let single =
                PermissionGate::new(permission).render(&resolver, || "children", Some("fallback"));
            let all_of_one = PermissionRequirement::from_props(&[permission], true, false);
            let all = PermissionGate::new(all_of_one)
                .render(&resolver, || "children", Some("fallback"));
            prop_assert_eq!(single, all);
        }
    }
}
