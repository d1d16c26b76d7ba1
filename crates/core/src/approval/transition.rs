//! Stage-advance table for the approval chain.
//!
//! The table is the single source of truth for how `approve` moves an
//! application forward. Stages without an entry fall through to
//! [`ADVANCE_DEFAULT`] so an approve on an out-of-chain record closes it
//! out instead of leaving it stuck.

use crate::approval::types::{ApprovalLevel, ApprovalStage};

/// Fixed advance table for `approve`: current stage → next stage.
pub const ADVANCE_ON_APPROVE: [(ApprovalStage, ApprovalStage); 3] = [
    (ApprovalStage::Level1, ApprovalStage::Level2),
    (ApprovalStage::Level2, ApprovalStage::Level3),
    (ApprovalStage::Level3, ApprovalStage::Approved),
];

/// Stage an approve lands on when the current stage has no table entry.
pub const ADVANCE_DEFAULT: ApprovalStage = ApprovalStage::Approved;

/// Looks up the stage an approve advances to from `from`.
#[must_use]
pub fn advance_on_approve(from: ApprovalStage) -> ApprovalStage {
    ADVANCE_ON_APPROVE
        .iter()
        .find(|(stage, _)| *stage == from)
        .map_or(ADVANCE_DEFAULT, |(_, next)| *next)
}

/// Returns the approval level a stage waits on, if it is part of the chain.
///
/// This is the level of the pending line that must exist while the
/// application sits at that stage.
#[must_use]
pub fn entry_level(stage: ApprovalStage) -> Option<ApprovalLevel> {
    match stage {
        ApprovalStage::Level1 => Some(ApprovalLevel::FIRST),
        ApprovalStage::Level2 => Some(ApprovalLevel::SECOND),
        ApprovalStage::Level3 => Some(ApprovalLevel::THIRD),
        ApprovalStage::Draft | ApprovalStage::Approved | ApprovalStage::Rejected => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApprovalStage::Level1, ApprovalStage::Level2)]
    #[case(ApprovalStage::Level2, ApprovalStage::Level3)]
    #[case(ApprovalStage::Level3, ApprovalStage::Approved)]
    fn test_advance_follows_table(#[case] from: ApprovalStage, #[case] expected: ApprovalStage) {
        assert_eq!(advance_on_approve(from), expected);
    }

    #[rstest]
    #[case(ApprovalStage::Draft)]
    #[case(ApprovalStage::Approved)]
    #[case(ApprovalStage::Rejected)]
    fn test_stages_absent_from_table_use_default(#[case] from: ApprovalStage) {
        assert_eq!(advance_on_approve(from), ADVANCE_DEFAULT);
    }

    #[test]
    fn test_every_stage_advances_somewhere() {
        // The table plus its default covers all stages; nothing panics or
        // stalls in place except the terminal the default points at.
        for stage in ApprovalStage::ALL {
            let next = advance_on_approve(stage);
            assert!(
                next != stage || stage == ADVANCE_DEFAULT,
                "stage {stage} advanced to itself"
            );
        }
    }

    #[test]
    fn test_table_has_no_duplicate_sources() {
        for (i, (from_a, _)) in ADVANCE_ON_APPROVE.iter().enumerate() {
            for (from_b, _) in &ADVANCE_ON_APPROVE[i + 1..] {
                assert_ne!(from_a, from_b);
            }
        }
    }

    #[rstest]
    #[case(ApprovalStage::Level1, Some(ApprovalLevel::FIRST))]
    #[case(ApprovalStage::Level2, Some(ApprovalLevel::SECOND))]
    #[case(ApprovalStage::Level3, Some(ApprovalLevel::THIRD))]
    #[case(ApprovalStage::Draft, None)]
    #[case(ApprovalStage::Approved, None)]
    #[case(ApprovalStage::Rejected, None)]
    fn test_entry_level(#[case] stage: ApprovalStage, #[case] expected: Option<ApprovalLevel>) {
        assert_eq!(entry_level(stage), expected);
    }

    #[test]
    fn test_table_targets_wait_on_their_entry_level() {
        // Every non-terminal target of the table has an entry level the
        // repository must open a pending line for.
        for (_, next) in ADVANCE_ON_APPROVE {
            if next.is_level() {
                assert!(entry_level(next).is_some());
            } else {
                assert!(entry_level(next).is_none());
            }
        }
    }
}
