use candid::{CandidType, Deserialize, Nat, Principal};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::storable::Bound;
use ic_stable_structures::{StableBTreeMap, StableCell, Storable};
use num_traits::ToPrimitive;
use std::borrow::Cow;
use std::cell::RefCell;

use crate::config::get_config;
use crate::types::RouletteError;
use crate::{Memory, MEMORY_MANAGER};
use super::accounting;
use super::audit::log_audit;
use super::fees;
use super::guard::OperationGuard;
use super::memory_ids::{LP_SHARES_MEMORY_ID, POOL_STATE_MEMORY_ID};
use super::nat_helpers::*;
use super::types::{AuditEvent, LPPosition, LPPositionInfo, PoolStats};

// Pool state for stable storage
#[derive(Clone, Debug, CandidType, Deserialize, PartialEq, Eq)]
pub struct PoolState {
    pub total_liquidity: Nat,
    /// Worst-case net liability of all pending rolls. Always <= total_liquidity.
    pub reserved: Nat,
}

impl Default for PoolState {
    fn default() -> Self {
        Self {
            total_liquidity: nat_zero(),
            reserved: nat_zero(),
        }
    }
}

impl Storable for PoolState {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect("CRITICAL: Failed to encode PoolState"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect("CRITICAL: Failed to decode PoolState from stable storage")
    }

    const BOUND: Bound = Bound::Unbounded;
}

// Storage
thread_local! {
    // LP shares by provider (linear: one share per unit deposited)
    static LP_SHARES: RefCell<StableBTreeMap<Principal, StorableNat, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(LP_SHARES_MEMORY_ID)))
        )
    );

    static POOL_STATE: RefCell<StableCell<PoolState, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(POOL_STATE_MEMORY_ID))),
            PoolState::default()
        )
    );
}

fn get_pool_state() -> PoolState {
    POOL_STATE.with(|s| s.borrow().get().clone())
}

fn update_pool_state<R>(f: impl FnOnce(&mut PoolState) -> R) -> R {
    POOL_STATE.with(|s| {
        let mut cell = s.borrow_mut();
        let mut state = cell.get().clone();
        let result = f(&mut state);
        cell.set(state);
        result
    })
}

// =============================================================================
// VIEWS
// =============================================================================

pub fn get_total_liquidity() -> Nat {
    get_pool_state().total_liquidity
}

pub fn get_reserved_liability() -> Nat {
    get_pool_state().reserved
}

/// Liquidity not reserved for pending rolls.
pub fn get_current_liquidity() -> Nat {
    let state = get_pool_state();
    nat_saturating_sub(&state.total_liquidity, &state.reserved)
}

pub fn get_provider_shares(provider: Principal) -> Nat {
    LP_SHARES.with(|s| s.borrow().get(&provider).map(Nat::from).unwrap_or_else(nat_zero))
}

pub fn total_provider_shares() -> Nat {
    LP_SHARES.with(|s| {
        s.borrow()
            .iter()
            .fold(nat_zero(), |acc, entry| acc + entry.value().0)
    })
}

pub fn count_liquidity_providers() -> u64 {
    LP_SHARES.with(|s| s.borrow().len())
}

pub fn get_lp_position_internal(provider: Principal) -> LPPosition {
    let shares = get_provider_shares(provider);
    let total = total_provider_shares();
    let pool_ownership_percent = if nat_is_zero(&total) {
        0.0
    } else {
        let shares_f = shares.0.to_f64().unwrap_or(0.0);
        let total_f = total.0.to_f64().unwrap_or(f64::MAX);
        shares_f / total_f * 100.0
    };
    LPPosition { shares, pool_ownership_percent }
}

pub fn iter_lp_positions_internal(offset: usize, limit: usize) -> Vec<LPPositionInfo> {
    LP_SHARES.with(|s| {
        s.borrow()
            .iter()
            .skip(offset)
            .take(limit)
            .map(|entry| LPPositionInfo {
                user: *entry.key(),
                shares: entry.value().0,
            })
            .collect()
    })
}

pub fn get_pool_stats_internal() -> PoolStats {
    let state = get_pool_state();
    PoolStats {
        current_liquidity: nat_saturating_sub(&state.total_liquidity, &state.reserved),
        total_liquidity: state.total_liquidity,
        reserved_liability: state.reserved,
        total_provider_shares: total_provider_shares(),
        total_liquidity_providers: count_liquidity_providers(),
        max_bet: max_bet(),
    }
}

// =============================================================================
// RISK CAP
// =============================================================================

/// `min(total_liquidity * percentage_cap, fixed_cap)`. Solvency against
/// pending rolls is `reserve_liability`'s job, not the cap's.
pub fn max_bet() -> Nat {
    let config = get_config();
    let by_pool = nat_mul_bps(&get_total_liquidity(), config.percentage_cap_bps);
    nat_min(&by_pool, &config.fixed_cap)
}

pub fn reserve_liability(amount: &Nat) -> Result<(), RouletteError> {
    if nat_is_zero(amount) {
        return Ok(());
    }
    update_pool_state(|state| {
        let available = nat_saturating_sub(&state.total_liquidity, &state.reserved);
        if *amount > available {
            return Err(RouletteError::InsufficientLiquidity);
        }
        state.reserved = state.reserved.clone() + amount.clone();
        Ok(())
    })
}

pub fn release_liability(amount: &Nat) {
    if nat_is_zero(amount) {
        return;
    }
    let underflow = update_pool_state(|state| match nat_subtract(&state.reserved, amount) {
        Some(reserved) => {
            state.reserved = reserved;
            false
        }
        None => {
            state.reserved = nat_zero();
            true
        }
    });
    if underflow {
        log_audit(AuditEvent::SystemError {
            error: format!("Released liability {} exceeds reserved total", amount),
        });
    }
}

/// Releases the roll's reservation, then applies `pool_credit - payout` to
/// the pool. The reservation makes a negative pool impossible; the clamp
/// below only fires on a bookkeeping bug.
pub fn settle_roll(pool_credit: &Nat, payout: &Nat, reserved: &Nat) {
    release_liability(reserved);

    let clamped = update_pool_state(|state| {
        let credited = state.total_liquidity.clone() + pool_credit.clone();
        match nat_subtract(&credited, payout) {
            Some(total) => {
                state.total_liquidity = total;
                false
            }
            None => {
                state.total_liquidity = nat_zero();
                true
            }
        }
    });

    if clamped {
        log_audit(AuditEvent::SystemError {
            error: format!(
                "CRITICAL: settlement would drive pool negative (credit {}, payout {}); clamped to zero",
                pool_credit, payout
            ),
        });
    }
}

// =============================================================================
// PROVIDER POSITIONS
// =============================================================================

pub fn credit_liquidity(provider: Principal, amount: &Nat) {
    LP_SHARES.with(|s| {
        let mut shares = s.borrow_mut();
        let current = shares.get(&provider).map(Nat::from).unwrap_or_else(nat_zero);
        shares.insert(provider, StorableNat(current + amount.clone()));
    });
    update_pool_state(|state| {
        state.total_liquidity = state.total_liquidity.clone() + amount.clone();
    });
}

/// Removes `amount` shares and pool balance, or nothing at all.
pub fn debit_liquidity(provider: Principal, amount: &Nat) -> Result<(), RouletteError> {
    let shares = get_provider_shares(provider);
    let remaining_shares = nat_subtract(&shares, amount).ok_or(RouletteError::InsufficientShares)?;

    if *amount > get_current_liquidity() {
        return Err(RouletteError::InsufficientLiquidity);
    }

    LP_SHARES.with(|s| {
        let mut map = s.borrow_mut();
        if nat_is_zero(&remaining_shares) {
            map.remove(&provider);
        } else {
            map.insert(provider, StorableNat(remaining_shares));
        }
    });
    update_pool_state(|state| {
        state.total_liquidity = nat_saturating_sub(&state.total_liquidity, amount);
    });
    Ok(())
}

/// Puts back a position whose outgoing transfer failed, with its fee.
pub fn restore_liquidity(provider: Principal, amount: Nat) {
    credit_liquidity(provider, &amount);
    fees::refund_transfer_fee();
    log_audit(AuditEvent::LiquidityRestored { provider, amount });
}

pub fn validate_liquidity_amount(caller: Principal, amount: &Nat) -> Result<(), RouletteError> {
    if caller == Principal::anonymous() {
        return Err(RouletteError::ValidationError("Anonymous principal cannot provide liquidity".to_string()));
    }
    accounting::validate_amount(amount)
}

/// Returns the amount to pull for a deposit of `amount`.
pub fn begin_add_liquidity(caller: Principal, amount: &Nat) -> Result<Nat, RouletteError> {
    validate_liquidity_amount(caller, amount)?;
    accounting::charge_incoming(amount)
}

/// The pull failed and the ledger charged nothing.
pub fn abort_add_liquidity() {
    fees::refund_transfer_fee();
}

/// Credits shares once the ledger pull succeeded.
pub fn complete_add_liquidity(caller: Principal, amount: Nat) -> Nat {
    credit_liquidity(caller, &amount);
    log_audit(AuditEvent::LiquidityAdded { provider: caller, amount });
    get_provider_shares(caller)
}

/// Takes the shares and pool balance out before the ledger push.
pub fn begin_remove_liquidity(caller: Principal, amount: &Nat) -> Result<Nat, RouletteError> {
    validate_liquidity_amount(caller, amount)?;
    fees::charge_transfer_fee()?;
    if let Err(e) = debit_liquidity(caller, amount) {
        fees::refund_transfer_fee();
        return Err(e);
    }
    log_audit(AuditEvent::LiquidityRemoved { provider: caller, amount: amount.clone() });
    Ok(get_provider_shares(caller))
}

pub async fn add_liquidity(caller: Principal, amount: Nat) -> Result<Nat, RouletteError> {
    let _guard = OperationGuard::new(caller)?;
    let pull = begin_add_liquidity(caller, &amount)?;

    if let Err(e) = accounting::transfer_from_user(caller, &pull).await {
        abort_add_liquidity();
        return Err(e);
    }

    Ok(complete_add_liquidity(caller, amount))
}

pub async fn remove_liquidity(caller: Principal, amount: Nat) -> Result<Nat, RouletteError> {
    let _guard = OperationGuard::new(caller)?;
    let remaining = begin_remove_liquidity(caller, &amount)?;

    if let Err(e) = accounting::transfer_to(caller, &amount).await {
        restore_liquidity(caller, amount);
        return Err(e);
    }
    Ok(remaining)
}
