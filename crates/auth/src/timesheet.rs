//! Timesheet-specific permissions and gate.
//!
//! Besides role-level capabilities, viewing or editing a single timesheet
//! also depends on ownership: employees may always see and edit their own.

use thiserror::Error;

use bizops_core::{Entity, Timesheet};

use crate::resolver::PermissionResolver;
use crate::{Permission, Role};

/// Closed set of timesheet actions a gate can check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimesheetAction {
    Create,
    ViewOwn,
    ViewAll,
    Approve,
    Reject,
    EditAll,
    ViewTimesheet,
    EditTimesheet,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown timesheet action '{0}'")]
pub struct UnknownAction(pub String);

impl TimesheetAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimesheetAction::Create => "create",
            TimesheetAction::ViewOwn => "view_own",
            TimesheetAction::ViewAll => "view_all",
            TimesheetAction::Approve => "approve",
            TimesheetAction::Reject => "reject",
            TimesheetAction::EditAll => "edit_all",
            TimesheetAction::ViewTimesheet => "view_timesheet",
            TimesheetAction::EditTimesheet => "edit_timesheet",
        }
    }

    /// Whether the action is about one specific timesheet.
    pub fn needs_instance(&self) -> bool {
        matches!(self, TimesheetAction::ViewTimesheet | TimesheetAction::EditTimesheet)
    }
}

impl core::str::FromStr for TimesheetAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(TimesheetAction::Create),
            "view_own" => Ok(TimesheetAction::ViewOwn),
            "view_all" => Ok(TimesheetAction::ViewAll),
            "approve" => Ok(TimesheetAction::Approve),
            "reject" => Ok(TimesheetAction::Reject),
            "edit_all" => Ok(TimesheetAction::EditAll),
            "view_timesheet" => Ok(TimesheetAction::ViewTimesheet),
            "edit_timesheet" => Ok(TimesheetAction::EditTimesheet),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl PermissionResolver<'_> {
    /// Review-only roles (`super_admin`, `administrator`) approve time but
    /// do not log their own.
    pub fn can_create_timesheet(&self) -> bool {
        let review_only = matches!(
            self.user_role(),
            Some(Role::SuperAdmin | Role::Administrator)
        );
        self.has_permission(Permission::Timesheets) && !review_only
    }

    pub fn can_view_own_timesheets(&self) -> bool {
        self.has_permission(Permission::Timesheets)
    }

    pub fn can_view_all_timesheets(&self) -> bool {
        self.has_permission(Permission::Approval)
    }

    pub fn can_approve_timesheets(&self) -> bool {
        self.has_permission(Permission::Approval)
    }

    pub fn can_reject_timesheets(&self) -> bool {
        self.has_permission(Permission::Approval)
    }

    pub fn can_edit_all_timesheets(&self) -> bool {
        self.is_admin_level() && self.has_permission(Permission::Approval)
    }

    /// Whether the current session's employee owns the timesheet.
    pub fn owns_timesheet(&self, timesheet: &Timesheet) -> bool {
        self.current_user()
            .and_then(|u| u.employee_id)
            .is_some_and(|id| timesheet.is_owned_by(&id))
    }

    pub fn can_view_timesheet(&self, timesheet: &Timesheet) -> bool {
        self.owns_timesheet(timesheet) || self.can_view_all_timesheets()
    }

    pub fn can_edit_timesheet(&self, timesheet: &Timesheet) -> bool {
        self.owns_timesheet(timesheet) || self.can_edit_all_timesheets()
    }

    /// Dispatch a timesheet action. Instance actions without a timesheet deny.
    pub fn can_timesheet(&self, action: TimesheetAction, timesheet: Option<&Timesheet>) -> bool {
        match action {
            TimesheetAction::Create => self.can_create_timesheet(),
            TimesheetAction::ViewOwn => self.can_view_own_timesheets(),
            TimesheetAction::ViewAll => self.can_view_all_timesheets(),
            TimesheetAction::Approve => self.can_approve_timesheets(),
            TimesheetAction::Reject => self.can_reject_timesheets(),
            TimesheetAction::EditAll => self.can_edit_all_timesheets(),
            TimesheetAction::ViewTimesheet | TimesheetAction::EditTimesheet => {
                let Some(ts) = timesheet else {
                    return false;
                };
                let allowed = if action == TimesheetAction::ViewTimesheet {
                    self.can_view_timesheet(ts)
                } else {
                    self.can_edit_timesheet(ts)
                };
                if !allowed {
                    tracing::debug!(
                        timesheet = %ts.id(),
                        action = action.as_str(),
                        "timesheet access denied"
                    );
                }
                allowed
            }
        }
    }
}

/// Gate for timesheet actions, optionally bound to one timesheet.
#[derive(Debug, Clone, Copy)]
pub struct TimesheetGate<'t> {
    action: TimesheetAction,
    timesheet: Option<&'t Timesheet>,
}

impl<'t> TimesheetGate<'t> {
    pub fn new(action: TimesheetAction) -> Self {
        Self {
            action,
            timesheet: None,
        }
    }

    /// Gate from a raw action tag; unknown tags always deny.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.parse() {
            Ok(action) => Some(Self::new(action)),
            Err(e) => {
                tracing::debug!(error = %e, "timesheet gate with unknown action");
                None
            }
        }
    }

    pub fn with_timesheet(mut self, timesheet: &'t Timesheet) -> Self {
        self.timesheet = Some(timesheet);
        self
    }

    pub fn action(&self) -> TimesheetAction {
        self.action
    }

    pub fn allows(&self, resolver: &PermissionResolver<'_>) -> bool {
        resolver.can_timesheet(self.action, self.timesheet)
    }

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
