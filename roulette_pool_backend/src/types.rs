// Pooled Roulette Type Definitions

use candid::{CandidType, Deserialize, Nat, Principal};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use serde::Serialize;
use std::borrow::Cow;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Internal fixed-point precision: every amount carries 18 fractional digits.
pub const DECIMALS: u32 = 18;
pub const ONE_UNIT: u128 = 1_000_000_000_000_000_000;

pub const BPS_DENOMINATOR: u64 = 10_000;
pub const DEFAULT_BET_FEE_BPS: u64 = 0;
pub const DEFAULT_PERCENTAGE_CAP_BPS: u64 = 100; // 1% of current liquidity
pub const DEFAULT_FIXED_CAP_UNITS: u64 = 100;
pub const DEFAULT_REDEEM_TIMELOCK_SECS: u64 = 2 * 60 * 60;
pub const MAX_BETS_PER_ROLL: usize = 20;

pub const CKUSDT_CANISTER_ID: &str = "cngnf-vqaaa-aaaar-qag4q-cai";
pub const CKUSDT_DECIMALS: u8 = 6;
pub const CKUSDT_TRANSFER_FEE: u64 = 10_000; // 0.01 USDT

/// `n` whole units in internal fixed-point.
pub fn units(n: u64) -> Nat {
    Nat::from(n) * Nat::from(ONE_UNIT)
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouletteError {
    #[error("invalid request: {0}")]
    ValidationError(String),
    #[error("bet of {amount} exceeds the max allowed bet of {max_bet}")]
    ExceedsMaxBet { amount: Nat, max_bet: Nat },
    #[error("insufficient liquidity shares")]
    InsufficientShares,
    #[error("insufficient chip balance")]
    InsufficientBalance,
    #[error("pool cannot cover the worst-case payout")]
    InsufficientLiquidity,
    #[error("redeem time not passed (ready at {ready_at})")]
    RedeemTimeNotPassed { ready_at: u64 },
    #[error("request id already completed")]
    AlreadyCompleted,
    #[error("unknown request id {0}")]
    RollNotFound(u64),
    #[error("unauthorized")]
    Unauthorized,
    #[error("ledger transfer failed: {0}")]
    TransferFailed(String),
    #[error("operation already in progress for this caller")]
    OperationInProgress,
    #[error("nothing to withdraw")]
    NothingToWithdraw,
    #[error("operator fee balance {available} cannot cover the ledger fee of {needed}")]
    InsufficientFeeBalance { needed: Nat, available: Nat },
}

// =============================================================================
// ICRC-1 / ICRC-2 TYPES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct Account {
    pub owner: Principal,
    pub subaccount: Option<[u8; 32]>,
}

impl From<Principal> for Account {
    fn from(owner: Principal) -> Self {
        Self {
            owner,
            subaccount: None,
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct TransferFromArgs {
    pub from: Account,
    pub to: Account,
    pub amount: Nat,
    pub fee: Option<Nat>,
    pub memo: Option<Vec<u8>>,
    pub created_at_time: Option<u64>,
    pub spender_subaccount: Option<[u8; 32]>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub enum TransferFromError {
    BadFee { expected_fee: Nat },
    BadBurn { min_burn_amount: Nat },
    InsufficientFunds { balance: Nat },
    InsufficientAllowance { allowance: Nat },
    TooOld,
    CreatedInFuture { ledger_time: u64 },
    Duplicate { duplicate_of: Nat },
    TemporarilyUnavailable,
    GenericError { error_code: Nat, message: String },
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct TransferArg {
    pub from_subaccount: Option<[u8; 32]>,
    pub to: Account,
    pub amount: Nat,
    pub fee: Option<Nat>,
    pub memo: Option<Vec<u8>>,
    pub created_at_time: Option<u64>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub enum TransferError {
    BadFee { expected_fee: Nat },
    BadBurn { min_burn_amount: Nat },
    InsufficientFunds { balance: Nat },
    TooOld,
    CreatedInFuture { ledger_time: u64 },
    Duplicate { duplicate_of: Nat },
    TemporarilyUnavailable,
    GenericError { error_code: Nat, message: String },
}

// =============================================================================
// ROULETTE TYPES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
    Black,
}

impl Color {
    /// Wire value used by Color bets (Green is never a valid bet value).
    pub fn value(self) -> u8 {
        match self {
            Color::Green => 0,
            Color::Red => 1,
            Color::Black => 2,
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BetType {
    Number, // value 0-36
    Color,  // value 1 = Red, 2 = Black
    Even,   // value 0 = even, 1 = odd
    Column, // value 0-2, outcome % 3
    Dozen,  // value 0-2
    Half,   // value 0 = 1-18, 1 = 19-36
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Bet {
    pub bet_type: BetType,
    pub value: u8,
    pub amount: Nat,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BetResult {
    pub bet_type: BetType,
    pub value: u8,
    pub amount: Nat,
    pub won: bool,
    pub multiplier: u8,
    pub payout: Nat, // includes the returned stake, 0 if lost
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RollResult {
    pub request_id: u64,
    pub outcome: u8,
    pub color: Color,
    pub bets: Vec<BetResult>,
    pub total_stake: Nat,
    pub fee: Nat,
    pub total_payout: Nat,
    pub net_result: candid::Int, // total_payout - total_stake
}

/// Lifecycle of a roll. `Pending` is the only non-terminal state.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum RollStatus {
    Pending,
    Resolved {
        outcome: u8,
        total_payout: Nat,
        fee: Nat,
        randomness_hash: Option<String>,
        resolved_at: u64,
    },
    Refunded {
        refunded_at: u64,
    },
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Roll {
    pub id: u64,
    pub wallet: Principal,
    pub bets: Vec<Bet>,
    pub total_stake: Nat,
    /// Fee locked in at submission and skimmed on resolution. The
    /// reservation has to cover it, so a later `set_bet_fee` cannot move it.
    pub fee: Nat,
    pub reserved_liability: Nat,
    pub created_at: u64,
    pub status: RollStatus,
}

impl Roll {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, RollStatus::Pending)
    }

    /// The single transition out of `Pending`. Whoever completes first wins;
    /// every later attempt gets `AlreadyCompleted`.
    pub fn complete(&mut self, status: RollStatus) -> Result<(), RouletteError> {
        if !self.is_pending() {
            return Err(RouletteError::AlreadyCompleted);
        }
        if matches!(status, RollStatus::Pending) {
            return Err(RouletteError::ValidationError(
                "a roll cannot transition back to Pending".to_string(),
            ));
        }
        self.status = status;
        Ok(())
    }
}

impl Storable for Roll {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            candid::encode_one(self).expect(
                "CRITICAL: Failed to encode Roll. \
                 This should never happen unless there's a bug in candid serialization.",
            ),
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode Roll from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade.",
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct BoardLayout {
    pub red_numbers: Vec<u8>,
    pub black_numbers: Vec<u8>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PayoutInfo {
    pub bet_type: BetType,
    pub value_range: String,
    pub payout_multiplier: u8,
    pub description: String,
}
