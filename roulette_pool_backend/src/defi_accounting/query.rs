use candid::{Nat, Principal};

use super::{accounting, fees, liquidity_pool};
use super::types::{LPPosition, PoolStats};

// =============================================================================
// CHIP QUERIES
// =============================================================================

pub fn get_chip_balance(user: Principal) -> Nat {
    accounting::get_chip_balance_internal(user)
}

// =============================================================================
// LIQUIDITY POOL QUERIES
// =============================================================================

pub fn get_total_liquidity() -> Nat {
    liquidity_pool::get_total_liquidity()
}

pub fn get_current_liquidity() -> Nat {
    liquidity_pool::get_current_liquidity()
}

pub fn get_max_bet() -> Nat {
    liquidity_pool::max_bet()
}

pub fn get_provider_shares(provider: Principal) -> Nat {
    liquidity_pool::get_provider_shares(provider)
}

pub fn get_lp_position(provider: Principal) -> LPPosition {
    liquidity_pool::get_lp_position_internal(provider)
}

pub fn get_pool_stats() -> PoolStats {
    liquidity_pool::get_pool_stats_internal()
}

// =============================================================================
// FEE QUERIES
// =============================================================================

pub fn get_collected_fees() -> Nat {
    fees::get_collected_fees()
}

pub fn get_bet_fee() -> u64 {
    crate::config::get_bet_fee()
}
