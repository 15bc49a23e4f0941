//! `bizops-auth`: client-side RBAC policy.
//!
//! This crate is decoupled from HTTP and from any UI framework: the session
//! is read through [`SessionSource`], and gates and route guards select
//! between caller-supplied views. The backend enforces its own authorization;
//! this layer decides what the client shows.

pub mod authorize;
pub mod gate;
pub mod guard;
pub mod permissions;
pub mod resolver;
pub mod roles;
pub mod routes;
pub mod session;
pub mod table;
pub mod timesheet;

pub use authorize::{AuthorizationExplanation, AuthzError, authorize, explain_authorization};
pub use gate::{PermissionGate, PermissionRequirement};
pub use guard::{AccessDenied, Page, ProtectedPage, RouteOutcome, protect};
pub use permissions::{Permission, UnknownPermission};
pub use resolver::{PermissionResolver, UserDisplayInfo, WildcardPolicy};
pub use roles::Role;
pub use routes::{AppRoute, default_route_for};
pub use session::{
    ClientStorage, MemoryStorage, SessionSource, SessionStore, SessionUser, StorageError,
};
pub use table::{PermissionSet, RolePermissionTable};
pub use timesheet::{TimesheetAction, TimesheetGate, UnknownAction};
