pub mod accounting;
pub mod admin_query;
pub mod audit;
pub mod fees;
pub mod guard;
pub mod liquidity_pool;
pub mod memory_ids;
pub mod nat_helpers;
pub mod query;
pub mod types;

#[cfg(test)]
mod tests;
