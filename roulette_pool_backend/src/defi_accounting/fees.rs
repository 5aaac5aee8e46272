use candid::{Nat, Principal};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::StableCell;
use std::cell::RefCell;

use crate::config::{get_config, require_operator};
use crate::types::RouletteError;
use crate::{Memory, MEMORY_MANAGER};
use super::accounting;
use super::audit::log_audit;
use super::guard::OperationGuard;
use super::memory_ids::COLLECTED_FEES_MEMORY_ID;
use super::nat_helpers::*;
use super::types::AuditEvent;

thread_local! {
    static COLLECTED_FEES: RefCell<StableCell<StorableNat, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(COLLECTED_FEES_MEMORY_ID))),
            StorableNat(nat_zero())
        )
    );
}

pub fn get_collected_fees() -> Nat {
    COLLECTED_FEES.with(|f| f.borrow().get().0.clone())
}

fn set_collected_fees(amount: Nat) {
    COLLECTED_FEES.with(|f| {
        f.borrow_mut().set(StorableNat(amount));
    });
}

/// `total_stake * bet_fee_bps / 10_000`, rounded down.
pub fn compute_fee(total_stake: &Nat) -> Nat {
    nat_mul_bps(total_stake, get_config().bet_fee_bps)
}

pub fn accrue_fee(fee: &Nat) {
    if nat_is_zero(fee) {
        return;
    }
    set_collected_fees(get_collected_fees() + fee.clone());
}

// =============================================================================
// LEDGER TRANSFER FEES
// =============================================================================

/// Ledger transfer fee in internal units.
pub fn transfer_fee() -> Nat {
    let config = get_config();
    accounting::from_ledger_units(&config.ledger_fee, config.ledger_decimals)
}

/// Every ledger transfer the canister makes or pulls is paid for out of the
/// collected fees, so players and providers move exactly what they ask for.
pub fn charge_transfer_fee() -> Result<(), RouletteError> {
    let fee = transfer_fee();
    if nat_is_zero(&fee) {
        return Ok(());
    }
    let available = get_collected_fees();
    match nat_subtract(&available, &fee) {
        Some(remaining) => {
            set_collected_fees(remaining);
            Ok(())
        }
        None => Err(RouletteError::InsufficientFeeBalance { needed: fee, available }),
    }
}

/// The transfer a fee was charged for did not happen.
pub fn refund_transfer_fee() {
    accrue_fee(&transfer_fee());
}

pub fn begin_fee_deposit(caller: Principal, amount: &Nat) -> Result<(), RouletteError> {
    require_operator(caller)?;
    accounting::validate_amount(amount)
}

pub fn complete_fee_deposit(caller: Principal, amount: Nat) -> Nat {
    accrue_fee(&amount);
    log_audit(AuditEvent::FeeBalanceFunded { operator: caller, amount });
    get_collected_fees()
}

/// Operator tops up the balance that pays ledger transfer fees. The operator
/// pays the fee of this pull itself.
pub async fn fund_fee_balance(caller: Principal, amount: Nat) -> Result<Nat, RouletteError> {
    let _guard = OperationGuard::new(caller)?;
    begin_fee_deposit(caller, &amount)?;

    accounting::transfer_from_user(caller, &amount).await?;

    Ok(complete_fee_deposit(caller, amount))
}

// =============================================================================
// OPERATOR WITHDRAWAL
// =============================================================================

/// Zeroes the fee balance and hands back the payout: what was there, less the
/// fee of the payout transfer, rounded down to ledger precision. Dust below
/// that precision stays behind.
pub fn take_collected_fees(caller: Principal) -> Result<Nat, RouletteError> {
    require_operator(caller)?;
    let collected = get_collected_fees();
    let after_fee = nat_subtract(&collected, &transfer_fee()).ok_or(RouletteError::NothingToWithdraw)?;
    let payout = accounting::round_down_to_ledger(&after_fee, get_config().ledger_decimals);
    if nat_is_zero(&payout) {
        return Err(RouletteError::NothingToWithdraw);
    }
    set_collected_fees(nat_saturating_sub(&after_fee, &payout));
    log_audit(AuditEvent::FeesWithdrawn { operator: caller, amount: payout.clone() });
    Ok(payout)
}

/// Puts back a payout whose transfer failed, together with its fee.
pub fn restore_fees(payout: Nat) {
    accrue_fee(&(payout.clone() + transfer_fee()));
    log_audit(AuditEvent::FeesRestored { amount: payout });
}

pub async fn withdraw_fees(caller: Principal) -> Result<Nat, RouletteError> {
    let _guard = OperationGuard::new(caller)?;
    let amount = take_collected_fees(caller)?;

    if let Err(e) = accounting::transfer_to(caller, &amount).await {
        restore_fees(amount);
        return Err(e);
    }
    Ok(amount)
}
