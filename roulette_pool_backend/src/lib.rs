//! Pooled-Liquidity Roulette Backend
//!
//! **Design Philosophy:**
//! A single European roulette table (single zero) underwritten by a shared
//! liquidity pool. Players hold internal chips exchanged 1:1 with a stable
//! asset; liquidity providers hold linear shares of the pool.
//!
//! **Settlement:**
//! - A roll debits chips, reserves the pool's worst-case liability and asks
//!   the randomness oracle for one outcome in 0-36
//! - The oracle's callback resolves the roll exactly once
//! - A roll whose outcome never arrives is refunded by `redeem` after the timelock
//!
//! **Randomness:**
//! - External oracle canister when configured
//! - Otherwise IC VRF (`raw_rand`) delivered from a one-shot timer

use candid::{Nat, Principal};
use ic_cdk::{init, post_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;

// ============================================================================
// LOGGING & CLOCK
// ============================================================================

/// Debug log line on the canister; compiled out for native test builds.
macro_rules! log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        ic_cdk::println!($($arg)*);
        #[cfg(not(target_arch = "wasm32"))]
        let _ = format_args!($($arg)*);
    }};
}
pub(crate) use log;

/// Current time in nanoseconds since the epoch.
#[cfg(target_arch = "wasm32")]
pub(crate) fn now() -> u64 {
    ic_cdk::api::time()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod board;
mod config;
mod defi_accounting;
pub mod game;
mod oracle;
mod rolls;
pub mod types;

pub use types::*;
use board::{BLACK_NUMBERS, RED_NUMBERS};
use config::{Config, InitArgs};
use defi_accounting::types::{AuditEntry, ChipBalanceInfo, HealthCheck, LPPosition, LPPositionInfo, PoolStats};

// ============================================================================
// MEMORY MANAGEMENT
// ============================================================================

pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    pub static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));
}

const MAX_ROLLS_PAGE: u64 = 100;

// ============================================================================
// LIFECYCLE HOOKS
// ============================================================================

#[init]
fn init(args: Option<InitArgs>) {
    let installer = ic_cdk::api::msg_caller();
    match Config::from_init_args(args.unwrap_or_default(), installer) {
        Ok(config) => {
            log!("Roulette pool initialized: operator {}, ledger {}", config.operator, config.asset_ledger);
            config::set_config(config);
        }
        Err(e) => ic_cdk::trap(format!("Invalid init args: {}", e)),
    }
}

#[post_upgrade]
fn post_upgrade() {
    // All state lives in stable structures
    let pending = rolls::pending_rolls().len();
    log!("Post-upgrade: state restored, {} rolls pending", pending);
}

// ============================================================================
// GAME ENDPOINTS
// ============================================================================

/// Submit bets for one spin. Returns the request id; the outcome arrives
/// asynchronously.
#[update]
async fn roll_bets(bets: Vec<Bet>) -> Result<u64, RouletteError> {
    rolls::roll_bets(ic_cdk::api::msg_caller(), bets).await
}

#[update]
fn fulfill_randomness(request_id: u64, outcome: u8) -> Result<Option<RollResult>, RouletteError> {
    rolls::fulfill_randomness(ic_cdk::api::msg_caller(), request_id, outcome, now())
}

/// Refund a roll stuck without an outcome. Open to anyone once the timelock passed.
#[update]
fn redeem(request_id: u64) -> Result<Nat, RouletteError> {
    rolls::redeem(request_id, now())
}

#[query]
fn get_roll(request_id: u64) -> Option<Roll> {
    rolls::get_roll(request_id)
}

#[query]
fn get_last_request_id() -> u64 {
    rolls::get_last_request_id()
}

#[query]
fn get_my_rolls(limit: u64) -> Vec<Roll> {
    rolls::rolls_for_wallet(ic_cdk::api::msg_caller(), limit.min(MAX_ROLLS_PAGE) as usize)
}

#[query]
fn get_max_bet() -> Nat {
    defi_accounting::query::get_max_bet()
}

// =============================================================================
// CHIP EXCHANGE ENDPOINTS
// =============================================================================

#[update]
async fn cash_in(amount: Nat) -> Result<Nat, RouletteError> {
    defi_accounting::accounting::cash_in(ic_cdk::api::msg_caller(), amount).await
}

#[update]
async fn cash_out(amount: Nat) -> Result<Nat, RouletteError> {
    defi_accounting::accounting::cash_out(ic_cdk::api::msg_caller(), amount).await
}

#[query]
fn get_chip_balance(principal: Principal) -> Nat {
    defi_accounting::query::get_chip_balance(principal)
}

#[query]
fn get_my_chip_balance() -> Nat {
    defi_accounting::query::get_chip_balance(ic_cdk::api::msg_caller())
}

// =============================================================================
// LIQUIDITY POOL ENDPOINTS
// =============================================================================

#[update]
async fn add_liquidity(amount: Nat) -> Result<Nat, RouletteError> {
    defi_accounting::liquidity_pool::add_liquidity(ic_cdk::api::msg_caller(), amount).await
}

#[update]
async fn remove_liquidity(amount: Nat) -> Result<Nat, RouletteError> {
    defi_accounting::liquidity_pool::remove_liquidity(ic_cdk::api::msg_caller(), amount).await
}

#[query]
fn get_total_liquidity() -> Nat {
    defi_accounting::query::get_total_liquidity()
}

#[query]
fn get_current_liquidity() -> Nat {
    defi_accounting::query::get_current_liquidity()
}

#[query]
fn get_provider_shares(principal: Principal) -> Nat {
    defi_accounting::query::get_provider_shares(principal)
}

#[query]
fn get_my_shares() -> Nat {
    defi_accounting::query::get_provider_shares(ic_cdk::api::msg_caller())
}

#[query]
fn get_lp_position(principal: Principal) -> LPPosition {
    defi_accounting::query::get_lp_position(principal)
}

#[query]
fn get_pool_stats() -> PoolStats {
    defi_accounting::query::get_pool_stats()
}

// =============================================================================
// FEE ENDPOINTS
// =============================================================================

#[update]
async fn withdraw_fees() -> Result<Nat, RouletteError> {
    defi_accounting::fees::withdraw_fees(ic_cdk::api::msg_caller()).await
}

/// Tops up the balance that pays ledger transfer fees (operator only).
#[update]
async fn fund_fee_balance(amount: Nat) -> Result<Nat, RouletteError> {
    defi_accounting::fees::fund_fee_balance(ic_cdk::api::msg_caller(), amount).await
}

#[update]
fn set_bet_fee(bps: u64) -> Result<(), RouletteError> {
    config::set_bet_fee(ic_cdk::api::msg_caller(), bps)
}

#[query]
fn get_bet_fee() -> u64 {
    defi_accounting::query::get_bet_fee()
}

#[query]
fn get_collected_fees() -> Nat {
    defi_accounting::query::get_collected_fees()
}

// =============================================================================
// ADMIN ENDPOINTS
// =============================================================================

#[update]
async fn admin_health_check() -> Result<HealthCheck, RouletteError> {
    defi_accounting::admin_query::admin_health_check(ic_cdk::api::msg_caller()).await
}

#[query]
fn admin_get_pending_rolls() -> Result<Vec<Roll>, RouletteError> {
    defi_accounting::admin_query::get_pending_rolls(ic_cdk::api::msg_caller())
}

#[query]
fn admin_get_all_chip_balances(offset: u64, limit: u64) -> Result<Vec<ChipBalanceInfo>, RouletteError> {
    defi_accounting::admin_query::get_all_chip_balances(ic_cdk::api::msg_caller(), offset, limit)
}

#[query]
fn admin_get_all_lp_positions(offset: u64, limit: u64) -> Result<Vec<LPPositionInfo>, RouletteError> {
    defi_accounting::admin_query::get_all_lp_positions(ic_cdk::api::msg_caller(), offset, limit)
}

#[query]
fn admin_get_audit_log(limit: u64, offset: u64) -> Result<Vec<AuditEntry>, RouletteError> {
    defi_accounting::admin_query::get_audit_log(ic_cdk::api::msg_caller(), limit, offset)
}

#[query]
fn admin_get_audit_log_count() -> Result<u64, RouletteError> {
    defi_accounting::admin_query::get_audit_log_count(ic_cdk::api::msg_caller())
}

// ============================================================================
// ROULETTE-SPECIFIC QUERY ENDPOINTS
// ============================================================================

/// Get the board layout (red and black numbers)
#[query]
fn get_board_layout() -> BoardLayout {
    BoardLayout {
        red_numbers: RED_NUMBERS.to_vec(),
        black_numbers: BLACK_NUMBERS.to_vec(),
    }
}

/// Get payout information for all bet types
#[query]
fn get_payouts() -> Vec<PayoutInfo> {
    game::payout_table()
}

#[query]
fn get_config() -> Config {
    config::get_config()
}

ic_cdk::export_candid!();
