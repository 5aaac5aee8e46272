//! Request ledger and the resolution state machine.
//!
//! A roll is opened against the player's chips and the pool's free liquidity,
//! then waits for exactly one outcome. It leaves `Pending` once, either by
//! resolution (oracle delivered) or refund (`redeem` after the timelock).

use candid::{Int, Nat, Principal};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

use crate::board::{get_color, is_valid_outcome};
use crate::config::{get_config, require_oracle};
use crate::defi_accounting::audit::log_audit;
use crate::defi_accounting::memory_ids::{REQUEST_COUNTER_MEMORY_ID, ROLLS_MEMORY_ID};
use crate::defi_accounting::nat_helpers::*;
use crate::defi_accounting::types::{sanitize_error, AuditEvent};
use crate::defi_accounting::{accounting, fees, liquidity_pool};
use crate::game;
use crate::oracle;
use crate::types::*;
use crate::{Memory, MEMORY_MANAGER};

thread_local! {
    // Every roll ever opened, terminal ones included
    static ROLLS: RefCell<StableBTreeMap<u64, Roll, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(ROLLS_MEMORY_ID)))
        )
    );

    static REQUEST_COUNTER: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(REQUEST_COUNTER_MEMORY_ID))),
            0u64
        )
    );
}

fn next_request_id() -> u64 {
    REQUEST_COUNTER.with(|c| {
        let mut counter = c.borrow_mut();
        let id = *counter.get() + 1;
        counter.set(id);
        id
    })
}

fn store_roll(roll: Roll) {
    ROLLS.with(|r| {
        r.borrow_mut().insert(roll.id, roll);
    });
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Validates and commits a roll: chips debited, liability reserved, record
/// stored as `Pending`. Nothing is mutated on any error.
pub fn open_roll(wallet: Principal, bets: Vec<Bet>, now: u64) -> Result<Roll, RouletteError> {
    let total_stake = game::validate_bets(&bets)?;

    let max_bet = liquidity_pool::max_bet();
    if let Some(bet) = bets.iter().find(|b| b.amount > max_bet) {
        return Err(RouletteError::ExceedsMaxBet {
            amount: bet.amount.clone(),
            max_bet,
        });
    }

    if accounting::get_chip_balance_internal(wallet) < total_stake {
        return Err(RouletteError::InsufficientBalance);
    }

    // Pool receives stake - fee and pays at most the worst case
    let fee = fees::compute_fee(&total_stake);
    let worst_case = game::worst_case_payout(&bets);
    let reserved_liability = nat_saturating_sub(&(worst_case + fee.clone()), &total_stake);
    if reserved_liability > liquidity_pool::get_current_liquidity() {
        return Err(RouletteError::InsufficientLiquidity);
    }

    liquidity_pool::reserve_liability(&reserved_liability)?;
    if let Err(e) = accounting::debit_chips(wallet, &total_stake) {
        liquidity_pool::release_liability(&reserved_liability);
        return Err(e);
    }

    let roll = Roll {
        id: next_request_id(),
        wallet,
        bets,
        total_stake,
        fee,
        reserved_liability,
        created_at: now,
        status: RollStatus::Pending,
    };
    store_roll(roll.clone());

    log_audit(AuditEvent::RollOpened {
        request_id: roll.id,
        wallet,
        total_stake: roll.total_stake.clone(),
        reserved: roll.reserved_liability.clone(),
    });
    Ok(roll)
}

/// Opens the roll, then asks the oracle for its outcome. A failed request
/// leaves the roll pending; `redeem` recovers it after the timelock.
pub async fn roll_bets(caller: Principal, bets: Vec<Bet>) -> Result<u64, RouletteError> {
    let roll = open_roll(caller, bets, crate::now())?;

    if let Err(e) = oracle::request_randomness(roll.id).await {
        log_audit(AuditEvent::RandomnessRequestFailed {
            request_id: roll.id,
            reason: sanitize_error(&e),
        });
    }
    Ok(roll.id)
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Settles a pending roll with `outcome`. An unknown or already completed id
/// is a no-op returning `Ok(None)`.
pub fn resolve_roll(
    request_id: u64,
    outcome: u8,
    randomness_hash: Option<String>,
    now: u64,
) -> Result<Option<RollResult>, RouletteError> {
    if !is_valid_outcome(outcome) {
        return Err(RouletteError::ValidationError(format!(
            "Outcome {} out of range 0-36",
            outcome
        )));
    }

    let mut roll = match get_roll(request_id) {
        Some(roll) if roll.is_pending() => roll,
        _ => {
            log_audit(AuditEvent::FulfillmentIgnored { request_id });
            return Ok(None);
        }
    };

    let (bet_results, total_payout) = game::evaluate_roll(&roll.bets, outcome);
    roll.complete(RollStatus::Resolved {
        outcome,
        total_payout: total_payout.clone(),
        fee: roll.fee.clone(),
        randomness_hash,
        resolved_at: now,
    })?;

    let pool_credit = nat_saturating_sub(&roll.total_stake, &roll.fee);
    fees::accrue_fee(&roll.fee);
    liquidity_pool::settle_roll(&pool_credit, &total_payout, &roll.reserved_liability);
    accounting::credit_chips(roll.wallet, &total_payout);
    store_roll(roll.clone());

    log_audit(AuditEvent::RollResolved {
        request_id,
        outcome,
        total_payout: total_payout.clone(),
        fee: roll.fee.clone(),
    });

    Ok(Some(RollResult {
        request_id,
        outcome,
        color: get_color(outcome),
        bets: bet_results,
        net_result: Int::from(total_payout.clone()) - Int::from(roll.total_stake.clone()),
        total_stake: roll.total_stake,
        fee: roll.fee,
        total_payout,
    }))
}

/// Oracle callback.
pub fn fulfill_randomness(
    caller: Principal,
    request_id: u64,
    outcome: u8,
    now: u64,
) -> Result<Option<RollResult>, RouletteError> {
    require_oracle(caller)?;
    resolve_roll(request_id, outcome, None, now)
}

/// Refunds the full stake of a roll whose outcome never arrived.
pub fn redeem(request_id: u64, now: u64) -> Result<Nat, RouletteError> {
    let mut roll = get_roll(request_id).ok_or(RouletteError::RollNotFound(request_id))?;
    if !roll.is_pending() {
        return Err(RouletteError::AlreadyCompleted);
    }

    let ready_at = roll.created_at.saturating_add(get_config().redeem_timelock_ns);
    if now < ready_at {
        return Err(RouletteError::RedeemTimeNotPassed { ready_at });
    }

    roll.complete(RollStatus::Refunded { refunded_at: now })?;
    liquidity_pool::release_liability(&roll.reserved_liability);
    accounting::credit_chips(roll.wallet, &roll.total_stake);
    store_roll(roll.clone());

    log_audit(AuditEvent::RollRefunded {
        request_id,
        wallet: roll.wallet,
        amount: roll.total_stake.clone(),
    });
    Ok(roll.total_stake)
}

// =============================================================================
// VIEWS
// =============================================================================

pub fn get_roll(request_id: u64) -> Option<Roll> {
    ROLLS.with(|r| r.borrow().get(&request_id))
}

pub fn get_last_request_id() -> u64 {
    REQUEST_COUNTER.with(|c| *c.borrow().get())
}

/// Most recent first.
pub fn rolls_for_wallet(wallet: Principal, limit: usize) -> Vec<Roll> {
    let mut rolls: Vec<Roll> = ROLLS.with(|r| {
        r.borrow()
            .iter()
            .map(|entry| entry.value())
            .filter(|roll| roll.wallet == wallet)
            .collect()
    });
    rolls.reverse();
    rolls.truncate(limit);
    rolls
}

pub fn pending_rolls() -> Vec<Roll> {
    ROLLS.with(|r| {
        r.borrow()
            .iter()
            .map(|entry| entry.value())
            .filter(Roll::is_pending)
            .collect()
    })
}

/// Stakes locked in pending rolls; held by the canister but owned by no one yet.
pub fn pending_stake_total() -> Nat {
    pending_rolls()
        .iter()
        .fold(nat_zero(), |acc, roll| acc + roll.total_stake.clone())
}
