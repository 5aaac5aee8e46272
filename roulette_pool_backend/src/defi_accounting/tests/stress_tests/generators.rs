use proptest::prelude::*;

use super::super::fixtures::{bet, milli};
use super::model::PLAYERS;
use super::Operation;
use crate::types::{Bet, BetType};

// Player ids 1..=PLAYERS; the seed provider sits outside this range
pub fn user_id() -> impl Strategy<Value = u8> {
    1..=PLAYERS
}

// 1 - 50 units
pub fn exchange_amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 1_000..10_000u64,
        1 => 10_000..50_000u64,
    ]
}

// 0.01 - 3 units, straddling the 10-unit cap only when the pool is small
pub fn stake() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 10..1_000u64,
        1 => 1_000..3_000u64,
    ]
}

pub fn placement() -> impl Strategy<Value = (BetType, u8)> {
    prop_oneof![
        3 => (0..=36u8).prop_map(|v| (BetType::Number, v)),
        3 => (1..=2u8).prop_map(|v| (BetType::Color, v)),
        1 => (0..=1u8).prop_map(|v| (BetType::Even, v)),
        1 => (0..=2u8).prop_map(|v| (BetType::Column, v)),
        1 => (0..=2u8).prop_map(|v| (BetType::Dozen, v)),
        1 => (0..=1u8).prop_map(|v| (BetType::Half, v)),
    ]
}

pub fn valid_bet() -> impl Strategy<Value = Bet> {
    (placement(), stake()).prop_map(|((bet_type, value), amount)| bet(bet_type, value, milli(amount)))
}

// Mostly valid sets; the rest carry an out-of-range value or a zero stake
pub fn bet_set() -> impl Strategy<Value = Vec<Bet>> {
    prop_oneof![
        12 => proptest::collection::vec(valid_bet(), 1..=4),
        1 => Just(vec![bet(BetType::Number, 37, milli(100))]),
        1 => Just(vec![bet(BetType::Color, 1, milli(0))]),
    ]
}

pub fn outcome() -> impl Strategy<Value = u8> {
    0..=36u8
}

// Mostly successful transfers (10% failing)
pub fn transfer_fails() -> impl Strategy<Value = bool> {
    prop_oneof![
        9 => Just(false),
        1 => Just(true),
    ]
}

// Generate random operation (weighted distribution)
pub fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        2 => (user_id(), exchange_amount()).prop_map(|(user, amount)| Operation::CashIn { user, amount }),
        1 => (user_id(), exchange_amount(), transfer_fails())
            .prop_map(|(user, amount, fail)| Operation::CashOut { user, amount, fail }),
        1 => (user_id(), exchange_amount()).prop_map(|(user, amount)| Operation::AddLiquidity { user, amount }),
        1 => (user_id(), exchange_amount(), transfer_fails())
            .prop_map(|(user, amount, fail)| Operation::RemoveLiquidity { user, amount, fail }),
        8 => (user_id(), bet_set()).prop_map(|(user, bets)| Operation::Roll { user, bets }),
        6 => (any::<usize>(), outcome()).prop_map(|(pick, outcome)| Operation::Fulfill { pick, outcome }),
        1 => (any::<u64>(), outcome()).prop_map(|(pick, outcome)| Operation::Redeliver { pick, outcome }),
        1 => (any::<usize>(), 0..4u64)
            .prop_map(|(pick, advance_hours)| Operation::Redeem { pick, advance_hours }),
        1 => transfer_fails().prop_map(|fail| Operation::WithdrawFees { fail }),
        1 => (0..=500u64).prop_map(|bps| Operation::SetFee { bps }),
    ]
}

// Generate sequence of N operations
pub fn operation_sequence(len: usize) -> impl Strategy<Value = Vec<Operation>> {
    proptest::collection::vec(operation(), len)
}
