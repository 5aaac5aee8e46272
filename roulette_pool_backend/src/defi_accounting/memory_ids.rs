//! Central registry for stable memory IDs.
//!
//! IMPORTANT: All memory IDs must be unique across the entire canister.
//! Run `cargo test` to verify no collisions exist.
//!
//! Allocation strategy:
//! - 0-9: Core game state (config, rolls, request counter)
//! - 10-19: Accounting (chip balances, LP shares, pool state, fees)
//! - 20-29: Audit

// Core game state (0-9)
pub const CONFIG_MEMORY_ID: u8 = 0;
pub const ROLLS_MEMORY_ID: u8 = 1;
pub const REQUEST_COUNTER_MEMORY_ID: u8 = 2;

// Accounting (10-19)
pub const CHIP_BALANCES_MEMORY_ID: u8 = 10;
pub const LP_SHARES_MEMORY_ID: u8 = 11;
pub const POOL_STATE_MEMORY_ID: u8 = 13;
pub const COLLECTED_FEES_MEMORY_ID: u8 = 14;

// Audit (20-29)
pub const AUDIT_LOG_MAP_MEMORY_ID: u8 = 24;
pub const AUDIT_LOG_COUNTER_MEMORY_ID: u8 = 25;
