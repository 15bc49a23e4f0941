//! `bizops-client`
//!
//! **Responsibility:** client-side session plumbing around the RBAC policy in
//! `bizops-auth`.
//!
//! This crate provides:
//! - File-backed client storage for the persisted session
//! - The backend session check (`GET /api/check-session`)
//! - Session lifecycle (login, logout, forced expiry, startup check)
//! - The session liveness watcher (idle timeout + backend polling)
//!
//! The backend remains the authority; nothing here is a security boundary.

pub mod check;
pub mod config;
pub mod lifecycle;
pub mod storage;
pub mod watcher;

pub use check::{HttpSessionCheck, SessionCheck, SessionCheckError, SessionStatus};
pub use config::{ClientConfig, ConfigError};
pub use lifecycle::{AuthState, LogoutNotice, LogoutReason, SessionLifecycle};
pub use storage::FileStorage;
pub use watcher::{
    ActivityEvent, ActivityReporter, LivenessConfig, SessionWatcher, WatchError, WatchExit,
    WatcherHandle,
};
