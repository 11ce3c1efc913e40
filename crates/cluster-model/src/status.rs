//! Cluster lifecycle status
//!
//! The status field is shared with the API layer, which sets the
//! `*_IN_PROGRESS` entry states before invoking the driver. The driver only
//! ever moves a cluster from an in-progress state to the matching
//! `*_COMPLETE` state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a cluster record.
///
/// Serializes as `SCREAMING_SNAKE_CASE` ("CREATE_IN_PROGRESS", ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    UpdateInProgress,
    UpdateFailed,
    UpdateComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
}

impl ClusterStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            ClusterStatus::CreateFailed => "CREATE_FAILED",
            ClusterStatus::CreateComplete => "CREATE_COMPLETE",
            ClusterStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            ClusterStatus::UpdateFailed => "UPDATE_FAILED",
            ClusterStatus::UpdateComplete => "UPDATE_COMPLETE",
            ClusterStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            ClusterStatus::DeleteFailed => "DELETE_FAILED",
            ClusterStatus::DeleteComplete => "DELETE_COMPLETE",
            ClusterStatus::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            ClusterStatus::RollbackFailed => "ROLLBACK_FAILED",
            ClusterStatus::RollbackComplete => "ROLLBACK_COMPLETE",
        }
    }

    /// True for the create/update entry states that converge on readiness.
    pub fn is_converging(&self) -> bool {
        matches!(
            self,
            ClusterStatus::CreateInProgress | ClusterStatus::UpdateInProgress
        )
    }

    /// True for the delete entry state.
    pub fn is_deleting(&self) -> bool {
        matches!(self, ClusterStatus::DeleteInProgress)
    }

    /// True when the driver has something to reconcile for this status.
    pub fn needs_sync(&self) -> bool {
        self.is_converging() || self.is_deleting()
    }

    /// The terminal state reached when a converging operation finishes.
    ///
    /// Returns `None` for statuses that do not converge on readiness.
    pub fn completed(&self) -> Option<ClusterStatus> {
        match self {
            ClusterStatus::CreateInProgress => Some(ClusterStatus::CreateComplete),
            ClusterStatus::UpdateInProgress => Some(ClusterStatus::UpdateComplete),
            ClusterStatus::DeleteInProgress => Some(ClusterStatus::DeleteComplete),
            _ => None,
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
