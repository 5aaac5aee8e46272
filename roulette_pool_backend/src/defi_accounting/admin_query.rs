use candid::{Nat, Principal};

use crate::config::require_operator;
use crate::rolls;
use crate::types::{Roll, RouletteError};
use super::audit;
use super::{accounting, fees, liquidity_pool};
use super::types::*;

#[cfg(target_arch = "wasm32")]
const WASM_PAGE_SIZE_BYTES: u64 = 65536;
const MAX_AUDIT_PAGE: u64 = 100;
const MAX_PAGE: u64 = 1_000;

/// Solvency snapshot against a known ledger balance.
///
/// Obligations are everything the canister owes: pool liquidity, chips,
/// stakes locked in pending rolls and uncollected fees. The ledger must hold
/// at least that much.
pub fn build_health_check(ledger_balance: Nat, timestamp: u64) -> HealthCheck {
    let total_liquidity = liquidity_pool::get_total_liquidity();
    let reserved_liability = liquidity_pool::get_reserved_liability();
    let total_chips = accounting::total_chips_internal();
    let pending_stakes = rolls::pending_stake_total();
    let collected_fees = fees::get_collected_fees();

    let obligations = total_liquidity.clone()
        + total_chips.clone()
        + pending_stakes.clone()
        + collected_fees.clone();
    let is_solvent = ledger_balance >= obligations;

    let health_status = if !is_solvent {
        format!("CRITICAL: INSOLVENT (obligations {} exceed ledger balance {})", obligations, ledger_balance)
    } else if reserved_liability > total_liquidity {
        "CRITICAL: reserved liability exceeds pool".to_string()
    } else if ledger_balance > obligations {
        "HEALTHY (excess held)".to_string()
    } else {
        "HEALTHY".to_string()
    };

    #[cfg(target_arch = "wasm32")]
    let heap_memory_bytes = (core::arch::wasm32::memory_size(0) as u64)
        .saturating_mul(WASM_PAGE_SIZE_BYTES);
    #[cfg(not(target_arch = "wasm32"))]
    let heap_memory_bytes: u64 = 0;

    #[cfg(target_arch = "wasm32")]
    let stable_memory_pages = ic_cdk::stable::stable_size();
    #[cfg(not(target_arch = "wasm32"))]
    let stable_memory_pages: u64 = 0;

    HealthCheck {
        total_liquidity,
        reserved_liability,
        total_chips,
        pending_stakes,
        collected_fees,
        obligations,
        ledger_balance,
        is_solvent,
        health_status,
        timestamp,
        pending_rolls: rolls::pending_rolls().len() as u64,
        unique_chip_holders: accounting::count_chip_holders(),
        unique_lps: liquidity_pool::count_liquidity_providers(),
        heap_memory_bytes,
        stable_memory_pages,
    }
}

pub async fn admin_health_check(caller: Principal) -> Result<HealthCheck, RouletteError> {
    require_operator(caller)?;
    let ledger_balance = accounting::fetch_ledger_balance().await?;
    Ok(build_health_check(ledger_balance, crate::now()))
}

/// Pending rolls, oldest first. Any of them past the timelock can be redeemed.
pub fn get_pending_rolls(caller: Principal) -> Result<Vec<Roll>, RouletteError> {
    require_operator(caller)?;
    Ok(rolls::pending_rolls())
}

pub fn get_all_chip_balances(caller: Principal, offset: u64, limit: u64) -> Result<Vec<ChipBalanceInfo>, RouletteError> {
    require_operator(caller)?;
    Ok(accounting::iter_chip_balances_internal(offset as usize, limit.min(MAX_PAGE) as usize))
}

pub fn get_all_lp_positions(caller: Principal, offset: u64, limit: u64) -> Result<Vec<LPPositionInfo>, RouletteError> {
    require_operator(caller)?;
    Ok(liquidity_pool::iter_lp_positions_internal(offset as usize, limit.min(MAX_PAGE) as usize))
}

/// Get paginated audit log entries (most recent first).
///
/// # Arguments
/// - `limit`: Maximum number of entries to return (max 100)
/// - `offset`: Number of entries to skip from the most recent
pub fn get_audit_log(caller: Principal, limit: u64, offset: u64) -> Result<Vec<AuditEntry>, RouletteError> {
    require_operator(caller)?;
    Ok(audit::get_audit_entries(limit.min(MAX_AUDIT_PAGE), offset))
}

pub fn get_audit_log_count(caller: Principal) -> Result<u64, RouletteError> {
    require_operator(caller)?;
    Ok(audit::get_audit_count())
}
