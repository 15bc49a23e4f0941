//! `bizops-core`: shared domain types for the session client.
//!
//! This crate contains **pure domain** primitives shared by the authorization
//! layer and the client (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod timesheet;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EmployeeId, TimesheetId, UserId};
pub use timesheet::{Timesheet, TimesheetStatus};
