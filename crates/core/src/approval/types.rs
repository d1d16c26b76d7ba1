//! Approval domain types for the budget application lifecycle.
//!
//! This module defines the core types used to track a budget application
//! through its approval chain and to describe the effects of user actions
//! on the application and its approval lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Approval stage of a budget application.
///
/// The stage is the authoritative progress pointer for the chain:
/// - draft → level_1 (submit)
/// - level_1 → level_2 → level_3 → approved (approve)
/// - any stage → rejected (reject)
///
/// Approval lines are the audit trail of who/when at each level; the
/// stage alone decides what happens next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    /// Application is being drafted and has not entered the chain.
    Draft,
    /// Waiting on the first approval level.
    #[serde(rename = "level_1")]
    Level1,
    /// Waiting on the second approval level.
    #[serde(rename = "level_2")]
    Level2,
    /// Waiting on the third approval level.
    #[serde(rename = "level_3")]
    Level3,
    /// All required levels approved.
    Approved,
    /// Rejected at some level.
    Rejected,
}

impl ApprovalStage {
    /// Every stage, in chain order. Used by exhaustive tests.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Level1,
        Self::Level2,
        Self::Level3,
        Self::Approved,
        Self::Rejected,
    ];

    /// Returns the string representation of the stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Level1 => "level_1",
            Self::Level2 => "level_2",
            Self::Level3 => "level_3",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a stage from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "level_1" => Some(Self::Level1),
            "level_2" => Some(Self::Level2),
            "level_3" => Some(Self::Level3),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the stage is an intermediate level of the chain.
    #[must_use]
    pub fn is_level(&self) -> bool {
        matches!(self, Self::Level1 | Self::Level2 | Self::Level3)
    }

    /// Returns true if the chain has ended for the normal flow.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Coarse status projected from the stage.
    ///
    /// The terminals map to themselves; every other stage counts as draft.
    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        match self {
            Self::Approved => ApplicationStatus::Approved,
            Self::Rejected => ApplicationStatus::Rejected,
            Self::Draft | Self::Level1 | Self::Level2 | Self::Level3 => ApplicationStatus::Draft,
        }
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse status of a budget application.
///
/// Superseded by [`ApprovalStage`] for anything the chain decides; kept as
/// a stored projection so list views filter cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Not yet through the chain.
    Draft,
    /// Chain completed with approval.
    Approved,
    /// Chain ended in rejection.
    Rejected,
}

impl ApplicationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution status of a single approval line.
///
/// A line is created `pending` and resolved exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    /// Waiting on its approver.
    Pending,
    /// Approved at this level.
    Approved,
    /// Rejected at this level.
    Rejected,
}

impl LineStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the line is still waiting on its approver.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approval level label carried by an approval line.
///
/// Deliberately a plain number rendered as a string ("1", "2", "3"), not
/// the stage enum: line records stay structurally reusable for any count
/// of levels while the stage remains the progress pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApprovalLevel(u8);

impl ApprovalLevel {
    /// First approval level.
    pub const FIRST: Self = Self(1);
    /// Second approval level.
    pub const SECOND: Self = Self(2);
    /// Third approval level.
    pub const THIRD: Self = Self(3);

    /// Wraps a raw level number.
    #[must_use]
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    /// Returns the raw level number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the label stored on approval lines ("1", "2", ...).
    #[must_use]
    pub fn label(self) -> String {
        self.0.to_string()
    }

    /// Parses a level from its stored label.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<u8>().ok().map(Self)
    }
}

impl fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimal view of an approval line for pure derivations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
    /// Resolution status of the line.
    pub status: LineStatus,
    /// Assigned approver, if any.
    pub approver_id: Option<Uuid>,
}

/// Mutation to apply to the pending approval line of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineResolution {
    /// Status the pending line resolves to.
    pub status: LineStatus,
    /// Resolution date stamped on the line.
    pub approval_date: NaiveDate,
}

/// Outcome of an approval-chain action.
///
/// Pure description of the stage the application moves to plus the
/// approval-line effects the action entails; the repository applies it
/// inside a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalAction {
    /// Enter the chain from draft.
    Submit {
        /// The stage after submission (first level).
        stage: ApprovalStage,
        /// Level of the pending line to create.
        opens_level: ApprovalLevel,
    },
    /// Resolve the pending line (if any) and advance the chain.
    Approve {
        /// The stage after approval.
        stage: ApprovalStage,
        /// Resolution for the pending line; `None` when no line was pending.
        resolution: Option<LineResolution>,
        /// Level of the next pending line to create, when the chain continues.
        opens_level: Option<ApprovalLevel>,
    },
    /// Resolve the pending line (if any) and close the chain as rejected.
    Reject {
        /// The stage after rejection (always rejected).
        stage: ApprovalStage,
        /// Resolution for the pending line; `None` when no line was pending.
        resolution: Option<LineResolution>,
    },
}

impl ApprovalAction {
    /// Returns the stage the application moves to.
    #[must_use]
    pub fn stage(&self) -> ApprovalStage {
        match self {
            Self::Submit { stage, .. }
            | Self::Approve { stage, .. }
            | Self::Reject { stage, .. } => *stage,
        }
    }

    /// Returns the level of the approval line this action creates, if any.
    #[must_use]
    pub fn opens_level(&self) -> Option<ApprovalLevel> {
        match self {
            Self::Submit { opens_level, .. } => Some(*opens_level),
            Self::Approve { opens_level, .. } => *opens_level,
            Self::Reject { .. } => None,
        }
    }

    /// Returns the resolution to apply to the pending line, if any.
    #[must_use]
    pub fn resolution(&self) -> Option<LineResolution> {
        match self {
            Self::Submit { .. } => None,
            Self::Approve { resolution, .. } | Self::Reject { resolution, .. } => *resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_as_str() {
        assert_eq!(ApprovalStage::Draft.as_str(), "draft");
        assert_eq!(ApprovalStage::Level1.as_str(), "level_1");
        assert_eq!(ApprovalStage::Level2.as_str(), "level_2");
        assert_eq!(ApprovalStage::Level3.as_str(), "level_3");
        assert_eq!(ApprovalStage::Approved.as_str(), "approved");
        assert_eq!(ApprovalStage::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in ApprovalStage::ALL {
            assert_eq!(ApprovalStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(ApprovalStage::parse("LEVEL_2"), Some(ApprovalStage::Level2));
        assert_eq!(ApprovalStage::parse("level_4"), None);
        assert_eq!(ApprovalStage::parse(""), None);
    }

    #[test]
    fn test_stage_serde_uses_stored_labels() {
        let json = serde_json::to_string(&ApprovalStage::Level1).unwrap();
        assert_eq!(json, "\"level_1\"");
        let back: ApprovalStage = serde_json::from_str("\"level_3\"").unwrap();
        assert_eq!(back, ApprovalStage::Level3);
    }

    #[test]
    fn test_stage_terminal() {
        assert!(!ApprovalStage::Draft.is_terminal());
        assert!(!ApprovalStage::Level1.is_terminal());
        assert!(!ApprovalStage::Level2.is_terminal());
        assert!(!ApprovalStage::Level3.is_terminal());
        assert!(ApprovalStage::Approved.is_terminal());
        assert!(ApprovalStage::Rejected.is_terminal());
    }

    #[test]
    fn test_stage_is_level() {
        assert!(ApprovalStage::Level1.is_level());
        assert!(ApprovalStage::Level2.is_level());
        assert!(ApprovalStage::Level3.is_level());
        assert!(!ApprovalStage::Draft.is_level());
        assert!(!ApprovalStage::Approved.is_level());
        assert!(!ApprovalStage::Rejected.is_level());
    }

    #[test]
    fn test_status_projection() {
        assert_eq!(ApprovalStage::Draft.status(), ApplicationStatus::Draft);
        assert_eq!(ApprovalStage::Level1.status(), ApplicationStatus::Draft);
        assert_eq!(ApprovalStage::Level2.status(), ApplicationStatus::Draft);
        assert_eq!(ApprovalStage::Level3.status(), ApplicationStatus::Draft);
        assert_eq!(
            ApprovalStage::Approved.status(),
            ApplicationStatus::Approved
        );
        assert_eq!(
            ApprovalStage::Rejected.status(),
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn test_line_status_parse() {
        assert_eq!(LineStatus::parse("pending"), Some(LineStatus::Pending));
        assert_eq!(LineStatus::parse("Approved"), Some(LineStatus::Approved));
        assert_eq!(LineStatus::parse("REJECTED"), Some(LineStatus::Rejected));
        assert_eq!(LineStatus::parse("open"), None);
        assert!(LineStatus::Pending.is_pending());
        assert!(!LineStatus::Approved.is_pending());
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(ApprovalLevel::FIRST.label(), "1");
        assert_eq!(ApprovalLevel::SECOND.label(), "2");
        assert_eq!(ApprovalLevel::THIRD.label(), "3");
        assert_eq!(ApprovalLevel::parse("2"), Some(ApprovalLevel::SECOND));
        assert_eq!(ApprovalLevel::parse(" 3 "), Some(ApprovalLevel::THIRD));
        assert_eq!(ApprovalLevel::parse("one"), None);
        assert_eq!(ApprovalLevel::new(7).get(), 7);
    }

    #[test]
    fn test_action_accessors() {
        let submit = ApprovalAction::Submit {
            stage: ApprovalStage::Level1,
            opens_level: ApprovalLevel::FIRST,
        };
        assert_eq!(submit.stage(), ApprovalStage::Level1);
        assert_eq!(submit.opens_level(), Some(ApprovalLevel::FIRST));
        assert_eq!(submit.resolution(), None);

        let reject = ApprovalAction::Reject {
            stage: ApprovalStage::Rejected,
            resolution: None,
        };
        assert_eq!(reject.stage(), ApprovalStage::Rejected);
        assert_eq!(reject.opens_level(), None);
    }
}
