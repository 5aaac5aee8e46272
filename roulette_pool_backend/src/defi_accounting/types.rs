use candid::{CandidType, Deserialize, Nat, Principal};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use std::borrow::Cow;

pub fn sanitize_error(msg: &str) -> String {
    msg.chars().take(256).collect()
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct AuditEntry {
    pub timestamp: u64,
    pub event: AuditEvent,
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq)]
pub enum AuditEvent {
    LiquidityAdded { provider: Principal, amount: Nat },
    LiquidityRemoved { provider: Principal, amount: Nat },
    /// Outgoing transfer failed; shares and pool balance put back.
    LiquidityRestored { provider: Principal, amount: Nat },
    ChipsMinted { user: Principal, amount: Nat },
    ChipsBurned { user: Principal, amount: Nat },
    ChipsRestored { user: Principal, amount: Nat },
    RollOpened { request_id: u64, wallet: Principal, total_stake: Nat, reserved: Nat },
    RollResolved { request_id: u64, outcome: u8, total_payout: Nat, fee: Nat },
    RollRefunded { request_id: u64, wallet: Principal, amount: Nat },
    RandomnessRequestFailed { request_id: u64, reason: String },
    /// Oracle delivered for an id that is unknown or no longer pending.
    FulfillmentIgnored { request_id: u64 },
    FeesWithdrawn { operator: Principal, amount: Nat },
    FeesRestored { amount: Nat },
    FeeBalanceFunded { operator: Principal, amount: Nat },
    BetFeeChanged { old_bps: u64, new_bps: u64 },
    SystemError { error: String },
}

impl Storable for AuditEntry {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            candid::encode_one(self).expect(
                "CRITICAL: Failed to encode AuditEntry. \
                 This should never happen unless there's a bug in candid serialization. \
                 Audit logging is failing - system integrity may be compromised."
            )
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode AuditEntry from stable storage. \
             This indicates audit log corruption or an incompatible upgrade. \
             Audit trail integrity cannot be guaranteed."
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

/// Health check result for operator monitoring.
/// All amounts are in internal 18-decimal units.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct HealthCheck {
    pub total_liquidity: Nat,
    pub reserved_liability: Nat,
    pub total_chips: Nat,
    pub pending_stakes: Nat,
    pub collected_fees: Nat,
    pub obligations: Nat,
    pub ledger_balance: Nat,
    pub is_solvent: bool,
    pub health_status: String,
    pub timestamp: u64,

    pub pending_rolls: u64,
    pub unique_chip_holders: u64,
    pub unique_lps: u64,
    pub heap_memory_bytes: u64,
    pub stable_memory_pages: u64,
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq)]
pub struct LPPosition {
    pub shares: Nat,
    pub pool_ownership_percent: f64,
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub total_liquidity: Nat,
    pub reserved_liability: Nat,
    pub current_liquidity: Nat,
    pub total_provider_shares: Nat,
    pub total_liquidity_providers: u64,
    pub max_bet: Nat,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct ChipBalanceInfo {
    pub user: Principal,
    pub balance: Nat,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct LPPositionInfo {
    pub user: Principal,
    pub shares: Nat,
}
