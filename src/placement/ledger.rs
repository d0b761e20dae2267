//! Append-only per-student credit ledger backing the application rate limit.
//!
//! Tokens live in three buckets: `remaining` (spendable), `engaged` (tied to
//! a pending application), and `consumed` (spent on a booked interview). An
//! entry's `amount` is the net change to the student's total holdings, so the
//! cached buckets are always re-derivable by replaying the entries: moves
//! between buckets are amount-0 entries whose reason encodes the movement,
//! grants are positive, forfeits are negative.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{StudentId, TokenBalances};

/// Why a ledger entry was written. The reason determines which buckets moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// Initial allocation or an administrative top-up into `remaining`.
    Grant,
    /// A token moved `remaining` -> `engaged` when an application was filed.
    EngagedOnApplication,
    /// An engaged token settled into `consumed` when an interview was booked.
    EngagementSettled,
    /// A withdrawn pending application returned its token to `remaining`.
    WithdrawalRefund,
    /// The quota cascade returned a pending applicant's token to `remaining`.
    QuotaRefund,
    /// A rejected or cancelled application forfeited its engaged token.
    DecisionForfeit,
}

impl LedgerReason {
    pub const fn label(self) -> &'static str {
        match self {
            LedgerReason::Grant => "grant",
            LedgerReason::EngagedOnApplication => "engaged_on_application",
            LedgerReason::EngagementSettled => "engagement_settled",
            LedgerReason::WithdrawalRefund => "withdrawal_refund",
            LedgerReason::QuotaRefund => "quota_refund",
            LedgerReason::DecisionForfeit => "decision_forfeit",
        }
    }
}

/// Immutable ledger row. Never mutated or deleted once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedgerEntry {
    pub id: String,
    pub student_id: StudentId,
    pub amount: i64,
    pub reason: LedgerReason,
    pub created_at: NaiveDateTime,
}

/// Ledger failures. Underflow means a balance mutation and its entry would
/// disagree; the enclosing operation must abort rather than commit the
/// divergence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no application tokens left")]
    InsufficientTokens,
    #[error("token ledger would drive the {bucket} bucket negative")]
    BucketUnderflow { bucket: &'static str },
}

/// A staged balance change plus the entry it must append. Both are applied in
/// the same commit or not at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LedgerMutation {
    pub balances: TokenBalances,
    pub amount: i64,
    pub reason: LedgerReason,
}

/// Credit `amount` fresh tokens into `remaining`.
pub(crate) fn grant(balances: TokenBalances, amount: u32) -> LedgerMutation {
    LedgerMutation {
        balances: TokenBalances {
            remaining: balances.remaining + amount,
            ..balances
        },
        amount: i64::from(amount),
        reason: LedgerReason::Grant,
    }
}

/// Engage one spendable token to a new application.
pub(crate) fn consume(balances: TokenBalances) -> Result<LedgerMutation, LedgerError> {
    if balances.remaining == 0 {
        return Err(LedgerError::InsufficientTokens);
    }
    Ok(LedgerMutation {
        balances: TokenBalances {
            remaining: balances.remaining - 1,
            engaged: balances.engaged + 1,
            consumed: balances.consumed,
        },
        amount: 0,
        reason: LedgerReason::EngagedOnApplication,
    })
}

/// Settle one engaged token into `consumed` when the interview is booked.
pub(crate) fn engage_to_consumed(balances: TokenBalances) -> Result<LedgerMutation, LedgerError> {
    if balances.engaged == 0 {
        return Err(LedgerError::BucketUnderflow { bucket: "engaged" });
    }
    Ok(LedgerMutation {
        balances: TokenBalances {
            remaining: balances.remaining,
            engaged: balances.engaged - 1,
            consumed: balances.consumed + 1,
        },
        amount: 0,
        reason: LedgerReason::EngagementSettled,
    })
}

/// Return `amount` engaged tokens to `remaining`.
pub(crate) fn refund(
    balances: TokenBalances,
    amount: u32,
    reason: LedgerReason,
) -> Result<LedgerMutation, LedgerError> {
    if balances.engaged < amount {
        return Err(LedgerError::BucketUnderflow { bucket: "engaged" });
    }
    Ok(LedgerMutation {
        balances: TokenBalances {
            remaining: balances.remaining + amount,
            engaged: balances.engaged - amount,
            consumed: balances.consumed,
        },
        amount: 0,
        reason,
    })
}

/// Destroy one engaged token. Rejection and cancellation do not return the
/// token to `remaining`, unlike withdrawal; see DESIGN.md before changing.
pub(crate) fn forfeit(balances: TokenBalances) -> Result<LedgerMutation, LedgerError> {
    if balances.engaged == 0 {
        return Err(LedgerError::BucketUnderflow { bucket: "engaged" });
    }
    Ok(LedgerMutation {
        balances: TokenBalances {
            engaged: balances.engaged - 1,
            ..balances
        },
        amount: -1,
        reason: LedgerReason::DecisionForfeit,
    })
}

/// Rebuild the three buckets from scratch by replaying entries in order.
/// The cached `Student` balances must always equal this replay.
pub fn replay<'a>(entries: impl IntoIterator<Item = &'a TokenLedgerEntry>) -> TokenBalances {
    let mut balances = TokenBalances::default();
    for entry in entries {
        match entry.reason {
            LedgerReason::Grant => {
                balances.remaining = balances
                    .remaining
                    .saturating_add(entry.amount.max(0) as u32);
            }
            LedgerReason::EngagedOnApplication => {
                balances.remaining = balances.remaining.saturating_sub(1);
                balances.engaged += 1;
            }
            LedgerReason::EngagementSettled => {
                balances.engaged = balances.engaged.saturating_sub(1);
                balances.consumed += 1;
            }
            LedgerReason::WithdrawalRefund | LedgerReason::QuotaRefund => {
                balances.engaged = balances.engaged.saturating_sub(1);
                balances.remaining += 1;
            }
            LedgerReason::DecisionForfeit => {
                balances.engaged = balances.engaged.saturating_sub(1);
            }
        }
    }
    balances
}
