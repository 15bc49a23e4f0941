//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are issued by the backend, which emits them either as JSON
//! strings or as JSON integers depending on the table. Both forms normalize to
//! the same trimmed textual representation, so `42` and `"42"` compare equal.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of an application user (login identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of an employee record (timesheet ownership).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

/// Identifier of a timesheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TimesheetId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

fn normalize(raw: &str, name: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_id(format!("{name}: empty identifier")));
    }
    Ok(trimmed.to_string())
}

macro_rules! impl_backend_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build an identifier from its textual form.
            ///
            /// Fails for empty (or whitespace-only) input.
            pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
                Ok(Self(normalize(value.as_ref(), $name)?))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value.to_string())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                match RawId::deserialize(deserializer)? {
                    RawId::Int(n) => Ok(Self::from(n)),
                    RawId::Text(s) => Self::new(s).map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

impl_backend_id!(UserId, "UserId");
impl_backend_id!(EmployeeId, "EmployeeId");
impl_backend_id!(TimesheetId, "TimesheetId");
