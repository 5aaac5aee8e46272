use candid::{Nat, Principal};
use ic_cdk::call::Call;
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

use crate::config::get_config;
use crate::types::{
    Account, RouletteError, TransferArg, TransferError, TransferFromArgs, TransferFromError, DECIMALS,
};
use crate::{Memory, MEMORY_MANAGER};
use super::audit::log_audit;
use super::fees;
use super::guard::OperationGuard;
use super::memory_ids::CHIP_BALANCES_MEMORY_ID;
use super::nat_helpers::*;
use super::types::{sanitize_error, AuditEvent, ChipBalanceInfo};

thread_local! {
    // Chip ledger: 1 chip = 1 unit of the stable asset, 18 decimals
    static CHIP_BALANCES: RefCell<StableBTreeMap<Principal, StorableNat, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(CHIP_BALANCES_MEMORY_ID)))
        )
    );
}

// =============================================================================
// CHIP LEDGER
// =============================================================================

pub fn get_chip_balance_internal(user: Principal) -> Nat {
    CHIP_BALANCES.with(|b| b.borrow().get(&user).map(Nat::from).unwrap_or_else(nat_zero))
}

/// Mint: winnings, refunds and cash-ins all land here.
pub fn credit_chips(user: Principal, amount: &Nat) -> Nat {
    if nat_is_zero(amount) {
        return get_chip_balance_internal(user);
    }
    CHIP_BALANCES.with(|b| {
        let mut balances = b.borrow_mut();
        let current = balances.get(&user).map(Nat::from).unwrap_or_else(nat_zero);
        let new_balance = current + amount.clone();
        balances.insert(user, StorableNat(new_balance.clone()));
        new_balance
    })
}

/// Burn. Leaves the balance untouched when it does not cover `amount`.
pub fn debit_chips(user: Principal, amount: &Nat) -> Result<Nat, RouletteError> {
    CHIP_BALANCES.with(|b| {
        let mut balances = b.borrow_mut();
        let current = balances.get(&user).map(Nat::from).unwrap_or_else(nat_zero);
        let new_balance = nat_subtract(&current, amount).ok_or(RouletteError::InsufficientBalance)?;
        if nat_is_zero(&new_balance) {
            balances.remove(&user);
        } else {
            balances.insert(user, StorableNat(new_balance.clone()));
        }
        Ok(new_balance)
    })
}

pub fn total_chips_internal() -> Nat {
    CHIP_BALANCES.with(|b| {
        b.borrow()
            .iter()
            .fold(nat_zero(), |acc, entry| acc + entry.value().0)
    })
}

pub fn count_chip_holders() -> u64 {
    CHIP_BALANCES.with(|b| b.borrow().len())
}

pub fn iter_chip_balances_internal(offset: usize, limit: usize) -> Vec<ChipBalanceInfo> {
    CHIP_BALANCES.with(|b| {
        b.borrow()
            .iter()
            .skip(offset)
            .take(limit)
            .map(|entry| ChipBalanceInfo {
                user: *entry.key(),
                balance: entry.value().0,
            })
            .collect()
    })
}

// =============================================================================
// DECIMAL SCALING
// =============================================================================

fn ledger_scale(ledger_decimals: u8) -> Nat {
    nat_pow10(DECIMALS.saturating_sub(ledger_decimals as u32))
}

/// Internal 18-decimal amount -> ledger units. Amounts finer than the
/// ledger's precision cannot be moved and are rejected.
pub fn to_ledger_units(amount: &Nat, ledger_decimals: u8) -> Result<Nat, RouletteError> {
    let scale = ledger_scale(ledger_decimals);
    if !nat_is_multiple_of(amount, &scale) {
        return Err(RouletteError::ValidationError(format!(
            "Amount must be a multiple of 10^{} (ledger has {} decimals)",
            DECIMALS.saturating_sub(ledger_decimals as u32),
            ledger_decimals
        )));
    }
    nat_divide(amount, &scale)
        .ok_or_else(|| RouletteError::ValidationError("Invalid ledger precision".to_string()))
}

pub fn from_ledger_units(amount: &Nat, ledger_decimals: u8) -> Nat {
    amount.clone() * ledger_scale(ledger_decimals)
}

/// Largest amount not above `amount` that the ledger can represent.
pub fn round_down_to_ledger(amount: &Nat, ledger_decimals: u8) -> Nat {
    let scale = ledger_scale(ledger_decimals);
    match nat_divide(amount, &scale) {
        Some(whole) => whole * scale,
        None => nat_zero(),
    }
}

/// Non-zero and representable on the asset ledger.
pub fn validate_amount(amount: &Nat) -> Result<(), RouletteError> {
    if nat_is_zero(amount) {
        return Err(RouletteError::ValidationError("Amount must be greater than zero".to_string()));
    }
    to_ledger_units(amount, get_config().ledger_decimals).map(|_| ())
}

/// Charges the ledger fee of an incoming pull to the operator fee balance
/// and returns the amount to pull. The ledger takes its fee from the payer on
/// top of the pull, so the payer's wallet drops by exactly `amount`.
pub fn charge_incoming(amount: &Nat) -> Result<Nat, RouletteError> {
    validate_amount(amount)?;
    let fee = fees::transfer_fee();
    let pull = match nat_subtract(amount, &fee) {
        Some(pull) if !nat_is_zero(&pull) => pull,
        _ => {
            return Err(RouletteError::ValidationError(format!(
                "Amount must exceed the ledger fee of {}",
                fee
            )))
        }
    };
    fees::charge_transfer_fee()?;
    Ok(pull)
}

// =============================================================================
// LEDGER CALLS
// =============================================================================

/// ICRC-2 pull from `user` into this canister. The ledger charges its fee to
/// `user` on top, so the canister receives exactly `amount`.
pub async fn transfer_from_user(user: Principal, amount: &Nat) -> Result<(), RouletteError> {
    let config = get_config();
    let args = TransferFromArgs {
        spender_subaccount: None,
        from: Account::from(user),
        to: Account::from(ic_cdk::api::canister_self()),
        amount: to_ledger_units(amount, config.ledger_decimals)?,
        fee: None,
        memo: None,
        created_at_time: None,
    };

    let response = Call::unbounded_wait(config.asset_ledger, "icrc2_transfer_from")
        .with_arg(&args)
        .await
        .map_err(|e| RouletteError::TransferFailed(sanitize_error(&format!("Call failed: {:?}", e))))?;
    let result: Result<Nat, TransferFromError> = response
        .candid()
        .map_err(|e| RouletteError::TransferFailed(sanitize_error(&format!("Decode failed: {:?}", e))))?;

    match result {
        Ok(block) => {
            crate::log!("transfer_from {} -> canister: {} at block {}", user, amount, block);
            Ok(())
        }
        Err(e) => Err(RouletteError::TransferFailed(sanitize_error(&format!("{:?}", e)))),
    }
}

/// ICRC-1 push of exactly `amount` from this canister to `recipient`. The
/// ledger fee comes out of the canister balance on top; callers charge it
/// to the operator fee balance first.
pub async fn transfer_to(recipient: Principal, amount: &Nat) -> Result<(), RouletteError> {
    let config = get_config();
    let args = TransferArg {
        from_subaccount: None,
        to: Account::from(recipient),
        amount: to_ledger_units(amount, config.ledger_decimals)?,
        fee: Some(config.ledger_fee.clone()),
        memo: None,
        created_at_time: None,
    };

    let response = Call::unbounded_wait(config.asset_ledger, "icrc1_transfer")
        .with_arg(&args)
        .await
        .map_err(|e| RouletteError::TransferFailed(sanitize_error(&format!("Call failed: {:?}", e))))?;
    let result: Result<Nat, TransferError> = response
        .candid()
        .map_err(|e| RouletteError::TransferFailed(sanitize_error(&format!("Decode failed: {:?}", e))))?;

    match result {
        Ok(block) => {
            crate::log!("transfer canister -> {}: {} at block {}", recipient, amount, block);
            Ok(())
        }
        Err(e) => Err(RouletteError::TransferFailed(sanitize_error(&format!("{:?}", e)))),
    }
}

/// Canister's own ledger balance, scaled to internal units.
pub async fn fetch_ledger_balance() -> Result<Nat, RouletteError> {
    let config = get_config();
    let account = Account::from(ic_cdk::api::canister_self());
    let response = Call::unbounded_wait(config.asset_ledger, "icrc1_balance_of")
        .with_arg(&account)
        .await
        .map_err(|e| RouletteError::TransferFailed(sanitize_error(&format!("Call failed: {:?}", e))))?;
    let balance: Nat = response
        .candid()
        .map_err(|e| RouletteError::TransferFailed(sanitize_error(&format!("Decode failed: {:?}", e))))?;
    Ok(from_ledger_units(&balance, config.ledger_decimals))
}

// =============================================================================
// CHIP EXCHANGE
// =============================================================================

/// Returns the amount to pull for a cash-in of `amount` chips.
pub fn begin_cash_in(amount: &Nat) -> Result<Nat, RouletteError> {
    charge_incoming(amount)
}

/// The pull failed and the ledger charged nothing.
pub fn abort_cash_in() {
    fees::refund_transfer_fee();
}

/// Mints chips once the ledger pull succeeded.
pub fn complete_cash_in(caller: Principal, amount: Nat) -> Nat {
    let new_balance = credit_chips(caller, &amount);
    log_audit(AuditEvent::ChipsMinted { user: caller, amount });
    new_balance
}

/// Burns the chips before the ledger push so they cannot be spent twice.
pub fn begin_cash_out(caller: Principal, amount: &Nat) -> Result<Nat, RouletteError> {
    validate_amount(amount)?;
    fees::charge_transfer_fee()?;
    let new_balance = match debit_chips(caller, amount) {
        Ok(balance) => balance,
        Err(e) => {
            fees::refund_transfer_fee();
            return Err(e);
        }
    };
    log_audit(AuditEvent::ChipsBurned { user: caller, amount: amount.clone() });
    Ok(new_balance)
}

/// Re-mints chips burned by a cash-out whose transfer failed.
pub fn rollback_cash_out(caller: Principal, amount: Nat) {
    credit_chips(caller, &amount);
    fees::refund_transfer_fee();
    log_audit(AuditEvent::ChipsRestored { user: caller, amount });
}

pub async fn cash_in(caller: Principal, amount: Nat) -> Result<Nat, RouletteError> {
    let _guard = OperationGuard::new(caller)?;
    let pull = begin_cash_in(&amount)?;

    if let Err(e) = transfer_from_user(caller, &pull).await {
        abort_cash_in();
        return Err(e);
    }

    Ok(complete_cash_in(caller, amount))
}

pub async fn cash_out(caller: Principal, amount: Nat) -> Result<Nat, RouletteError> {
    let _guard = OperationGuard::new(caller)?;
    let new_balance = begin_cash_out(caller, &amount)?;

    if let Err(e) = transfer_to(caller, &amount).await {
        rollback_cash_out(caller, amount);
        return Err(e);
    }
    Ok(new_balance)
}
