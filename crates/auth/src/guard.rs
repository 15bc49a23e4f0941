//! Route protection: wrap a page so it only renders for permitted sessions.
//!
//! Every protected route must be wrapped; an unwrapped page is reachable by
//! anyone who knows its path.

use serde::Serialize;

use crate::authorize::{AuthzError, authorize};
use crate::resolver::PermissionResolver;
use crate::routes::AppRoute;
use crate::Permission;

/// A renderable page taking `P` props.
pub trait Page<P> {
    type View;

    fn render(&self, props: P) -> Self::View;
}

impl<P, V, F> Page<P> for F
where
    F: Fn(P) -> V,
{
    type View = V;

    fn render(&self, props: P) -> V {
        self(props)
    }
}

/// Data for the full-page "Access Denied" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDenied {
    pub required: Permission,
    pub role: String,
    /// Where the "go back" button navigates.
    pub home: AppRoute,
}

impl AccessDenied {
    pub fn title(&self) -> &'static str {
        "Access Denied"
    }

    pub fn message(&self) -> String {
        format!(
            "You need the '{}' permission to view this page. Your current role is '{}'.",
            self.required, self.role
        )
    }
}

/// Result of rendering a protected page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome<V> {
    /// No session: navigate to the given route (login).
    Redirect { to: AppRoute },
    AccessDenied(AccessDenied),
    Rendered(V),
}

impl<V> RouteOutcome<V> {
    pub fn rendered(self) -> Option<V> {
        match self {
            RouteOutcome::Rendered(view) => Some(view),
            _ => None,
        }
    }
}

/// A page wrapped with a required permission.
#[derive(Debug, Clone)]
pub struct ProtectedPage<G> {
    page: G,
    required: Permission,
}

/// Wrap `page` so it renders only when `required` is granted.
pub fn protect<G>(page: G, required: Permission) -> ProtectedPage<G> {
    ProtectedPage { page, required }
}

impl<G> ProtectedPage<G> {
    pub fn required(&self) -> Permission {
        self.required
    }

    pub fn render<P>(
        &self,
        resolver: &PermissionResolver<'_>,
        props: P,
    ) -> RouteOutcome<<G as Page<P>>::View>
    where
        G: Page<P>,
    {
        match authorize(resolver, self.required) {
            Ok(()) => RouteOutcome::Rendered(self.page.render(props)),
            Err(AuthzError::Unauthenticated) => {
                tracing::debug!(required = %self.required, "unauthenticated; redirecting to login");
                RouteOutcome::Redirect { to: AppRoute::Login }
            }
            Err(AuthzError::Forbidden { permission, role }) => {
                tracing::info!(required = %permission, role = %role, "page access denied");
                RouteOutcome::AccessDenied(AccessDenied {
                    required: permission,
                    role,
                    home: resolver.default_route(),
                })
            }
        }
    }
}
