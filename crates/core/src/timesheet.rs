//! Timesheet entity as seen by the authorization layer.
//!
//! The full CRUD lifecycle lives with the pages that own timesheets; this type
//! only carries what permission checks read: identity, owner and status.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::{EmployeeId, TimesheetId};

/// Review status of a timesheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimesheetStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Declined,
    Archived,
}

impl TimesheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimesheetStatus::Draft => "draft",
            TimesheetStatus::Submitted => "submitted",
            TimesheetStatus::Approved => "approved",
            TimesheetStatus::Declined => "declined",
            TimesheetStatus::Archived => "archived",
        }
    }
}

impl core::fmt::Display for TimesheetStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timesheet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timesheet {
    pub id: TimesheetId,
    #[serde(alias = "employeeId")]
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub status: TimesheetStatus,
}

impl Timesheet {
    pub fn new(id: TimesheetId, employee_id: EmployeeId, status: TimesheetStatus) -> Self {
        Self {
            id,
            employee_id,
            status,
        }
    }

    /// Whether the given employee owns this timesheet.
    pub fn is_owned_by(&self, employee_id: &EmployeeId) -> bool {
        &self.employee_id == employee_id
    }
}

impl Entity for Timesheet {
    type Id = TimesheetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_payload() {
        let payload = r#"{"id": 12, "employeeId": "7", "status": "submitted"}"#;
        let ts: Timesheet = serde_json::from_str(payload).unwrap();
        assert_eq!(ts.id().as_str(), "12");
        assert!(ts.is_owned_by(&EmployeeId::from(7)));
        assert_eq!(ts.status, TimesheetStatus::Submitted);
    }

    #[test]
    fn missing_status_defaults_to_draft() {
        let ts: Timesheet = serde_json::from_str(r#"{"id": "a", "employee_id": 1}"#).unwrap();
        assert_eq!(ts.status, TimesheetStatus::Draft);
        assert!(!ts.is_owned_by(&EmployeeId::from(2)));
    }
}
