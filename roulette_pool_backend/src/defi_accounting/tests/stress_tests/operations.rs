use crate::types::{Bet, RouletteError};

#[derive(Debug, Clone, PartialEq)]
pub enum OpResult {
    Success,
    /// Nothing to act on (no pending roll, or a redelivery that was dropped).
    Ignored,
    Rejected(RouletteError),
}

impl<T> From<Result<T, RouletteError>> for OpResult {
    fn from(result: Result<T, RouletteError>) -> Self {
        match result {
            Ok(_) => OpResult::Success,
            Err(e) => OpResult::Rejected(e),
        }
    }
}

/// Amounts are in thousandths of a unit.
#[derive(Debug, Clone)]
pub enum Operation {
    CashIn { user: u8, amount: u64 },
    CashOut { user: u8, amount: u64, fail: bool },
    AddLiquidity { user: u8, amount: u64 },
    RemoveLiquidity { user: u8, amount: u64, fail: bool },
    Roll { user: u8, bets: Vec<Bet> },
    /// Oracle delivery for the `pick`-th pending roll.
    Fulfill { pick: usize, outcome: u8 },
    /// Oracle delivery for any id ever issued, completed or not.
    Redeliver { pick: u64, outcome: u8 },
    Redeem { pick: usize, advance_hours: u64 },
    WithdrawFees { fail: bool },
    SetFee { bps: u64 },
}
