use candid::{Int, Nat};

use super::super::fixtures::*;
use crate::defi_accounting::audit::get_audit_entries;
use crate::defi_accounting::nat_helpers::*;
use crate::defi_accounting::types::AuditEvent;
use crate::defi_accounting::{accounting, fees, liquidity_pool};
use crate::rolls;
use crate::types::*;

const HOUR_NS: u64 = 60 * 60 * 1_000_000_000;

/// Pool funded by one provider, one player with chips.
fn table(pool: u64, chips: u64, bet_fee_bps: u64) -> Ledger {
    install(bet_fee_bps);
    let mut ledger = Ledger::new();
    ledger.fund(user(1), units(pool));
    ledger.fund(user(2), units(chips));
    ledger.add_liquidity(user(1), units(pool)).unwrap();
    ledger.cash_in(user(2), units(chips)).unwrap();
    ledger
}

fn player() -> candid::Principal {
    user(2)
}

/// Whole units with a sign.
fn signed_units(n: i64) -> Int {
    let magnitude = Int::from(units(n.unsigned_abs()));
    if n < 0 {
        Int::from(0i64) - magnitude
    } else {
        magnitude
    }
}

fn spin(bets: Vec<Bet>, outcome: u8, now: u64) -> RollResult {
    let roll = rolls::open_roll(player(), bets, now).unwrap();
    rolls::fulfill_randomness(oracle(), roll.id, outcome, now + 1)
        .unwrap()
        .expect("pending roll must resolve")
}

#[test]
fn test_red_then_black_scenario() {
    let ledger = table(100, 100, 0);

    // Red on 2 (black) loses
    spin(vec![bet(BetType::Color, 1, units(1))], 2, 0);
    assert_eq!(accounting::get_chip_balance_internal(player()), units(99));
    assert_eq!(liquidity_pool::get_total_liquidity(), units(101));

    // Black on 18 (red) loses
    spin(vec![bet(BetType::Color, 2, units(1))], 18, 10);
    assert_eq!(accounting::get_chip_balance_internal(player()), units(98));
    assert_eq!(liquidity_pool::get_total_liquidity(), units(102));

    ledger.check_conservation().unwrap();
    ledger.check_reservation().unwrap();
}

#[test]
fn test_mixed_bet_set_outcomes() {
    // {Red 3, Half(0) 4} against four outcomes: net chip change per spin
    let cases: [(u8, i64); 4] = [(0, -7), (1, 7), (11, 1), (25, -1)];
    let ledger = table(1_000, 100, 0);

    for (i, (outcome, expected_net)) in cases.into_iter().enumerate() {
        let chips_before = accounting::get_chip_balance_internal(player());
        let pool_before = liquidity_pool::get_total_liquidity();

        let result = spin(
            vec![bet(BetType::Color, 1, units(3)), bet(BetType::Half, 0, units(4))],
            outcome,
            i as u64 * 10,
        );

        let expected = signed_units(expected_net);
        assert_eq!(result.net_result, expected, "outcome {}", outcome);

        let chips_after = accounting::get_chip_balance_internal(player());
        let pool_after = liquidity_pool::get_total_liquidity();
        assert_eq!(
            Int::from(chips_after) - Int::from(chips_before),
            expected,
            "chips for outcome {}",
            outcome
        );
        // Zero fee: the pool moves by exactly the opposite amount
        assert_eq!(
            Int::from(pool_after) - Int::from(pool_before),
            signed_units(-expected_net),
            "pool for outcome {}",
            outcome
        );
    }

    ledger.check_conservation().unwrap();
}

#[test]
fn test_fee_skim_leaves_player_outcome_unchanged() {
    let ledger = table(1_000, 100, 200);

    let result = spin(
        vec![bet(BetType::Color, 1, units(3)), bet(BetType::Half, 0, units(4))],
        0,
        0,
    );

    // 2% of 7
    let fee = nat_mul_bps(&units(14), 100);
    assert_eq!(result.fee, fee);
    assert_eq!(fees::get_collected_fees(), fee);
    assert_eq!(accounting::get_chip_balance_internal(player()), units(93));
    assert_eq!(
        liquidity_pool::get_total_liquidity(),
        nat_subtract(&(units(1_000) + units(7)), &fee).unwrap()
    );

    ledger.check_conservation().unwrap();
}

#[test]
fn test_chips_follow_stake_and_payout() {
    let ledger = table(10_000, 100, 150);
    let bets = vec![
        bet(BetType::Number, 17, units(2)),
        bet(BetType::Dozen, 1, units(5)),
        bet(BetType::Column, 2, units(3)),
        bet(BetType::Even, 1, units(1)),
    ];

    for (i, outcome) in [17u8, 0, 14, 35, 22].into_iter().enumerate() {
        let before = accounting::get_chip_balance_internal(player());
        let result = spin(bets.clone(), outcome, i as u64);
        let after = accounting::get_chip_balance_internal(player());

        assert_eq!(result.total_stake, units(11));
        assert_eq!(
            after,
            nat_subtract(&before, &result.total_stake).unwrap() + result.total_payout.clone(),
            "outcome {}",
            outcome
        );
    }

    ledger.check_conservation().unwrap();
    ledger.check_reservation().unwrap();
}

#[test]
fn test_bet_above_max_rejects_whole_roll() {
    let ledger = table(100, 100, 0);

    let result = rolls::open_roll(
        player(),
        vec![bet(BetType::Color, 1, units(1)), bet(BetType::Number, 7, milli(1_001))],
        0,
    );
    assert_eq!(
        result.err(),
        Some(RouletteError::ExceedsMaxBet { amount: milli(1_001), max_bet: units(1) })
    );
    assert_eq!(accounting::get_chip_balance_internal(player()), units(100));
    assert_eq!(rolls::get_last_request_id(), 0);

    ledger.check_conservation().unwrap();
}

#[test]
fn test_pending_rolls_do_not_shrink_max_bet() {
    let ledger = table(1_000, 100, 0);
    rolls::open_roll(player(), vec![bet(BetType::Number, 7, units(10))], 0).unwrap();
    assert_eq!(liquidity_pool::get_current_liquidity(), units(650));

    // Still 1% of the 1_000 total
    assert_eq!(liquidity_pool::max_bet(), units(10));
    rolls::open_roll(player(), vec![bet(BetType::Color, 1, units(10))], 1).unwrap();

    ledger.check_conservation().unwrap();
    ledger.check_reservation().unwrap();
}

#[test]
fn test_redeem_before_and_after_timelock() {
    let ledger = table(100, 100, 0);
    let roll = rolls::open_roll(player(), vec![bet(BetType::Dozen, 0, units(1))], 0).unwrap();
    assert_eq!(accounting::get_chip_balance_internal(player()), units(99));

    assert_eq!(
        rolls::redeem(roll.id, HOUR_NS),
        Err(RouletteError::RedeemTimeNotPassed { ready_at: 2 * HOUR_NS })
    );
    ledger.check_conservation().unwrap();

    assert_eq!(rolls::redeem(roll.id, 3 * HOUR_NS), Ok(units(1)));
    assert_eq!(accounting::get_chip_balance_internal(player()), units(100));
    assert_eq!(liquidity_pool::get_total_liquidity(), units(100));
    assert!(matches!(
        rolls::get_roll(roll.id).unwrap().status,
        RollStatus::Refunded { refunded_at } if refunded_at == 3 * HOUR_NS
    ));

    ledger.check_conservation().unwrap();
    ledger.check_reservation().unwrap();
}

#[test]
fn test_late_callback_after_refund_is_noop() {
    let ledger = table(100, 100, 0);
    let roll = rolls::open_roll(player(), vec![bet(BetType::Number, 7, units(1))], 0).unwrap();
    rolls::redeem(roll.id, 3 * HOUR_NS).unwrap();

    // Winning number arrives too late
    assert_eq!(rolls::fulfill_randomness(oracle(), roll.id, 7, 4 * HOUR_NS), Ok(None));
    assert_eq!(rolls::redeem(roll.id, 5 * HOUR_NS), Err(RouletteError::AlreadyCompleted));

    assert_eq!(accounting::get_chip_balance_internal(player()), units(100));
    assert_eq!(liquidity_pool::get_total_liquidity(), units(100));
    assert_eq!(
        get_audit_entries(2, 0)[0].event,
        AuditEvent::FulfillmentIgnored { request_id: roll.id }
    );
    ledger.check_conservation().unwrap();
}

#[test]
fn test_redeem_after_resolution_fails() {
    let ledger = table(100, 100, 0);
    let result = spin(vec![bet(BetType::Half, 1, units(1))], 30, 0);
    let chips = accounting::get_chip_balance_internal(player());
    assert_eq!(chips, units(101));

    assert_eq!(rolls::redeem(result.request_id, 3 * HOUR_NS), Err(RouletteError::AlreadyCompleted));
    assert_eq!(accounting::get_chip_balance_internal(player()), chips);
    ledger.check_conservation().unwrap();
}

#[test]
fn test_many_pending_rolls_resolve_independently() {
    let ledger = table(10_000, 100, 0);
    let ids: Vec<u64> = (0..5)
        .map(|i| {
            rolls::open_roll(player(), vec![bet(BetType::Number, i, units(1))], i as u64)
                .unwrap()
                .id
        })
        .collect();
    assert_eq!(rolls::pending_rolls().len(), 5);
    assert_eq!(rolls::pending_stake_total(), units(5));
    ledger.check_reservation().unwrap();

    // Resolve out of order; only roll for number 3 wins
    for &id in ids.iter().rev() {
        rolls::fulfill_randomness(oracle(), id, 3, 100).unwrap();
    }
    assert!(rolls::pending_rolls().is_empty());
    assert_eq!(liquidity_pool::get_reserved_liability(), nat_zero());
    assert_eq!(accounting::get_chip_balance_internal(player()), units(95) + units(36));

    ledger.check_conservation().unwrap();
}

#[test]
fn test_unauthorized_and_invalid_delivery() {
    let ledger = table(100, 100, 0);
    let roll = rolls::open_roll(player(), vec![bet(BetType::Color, 1, units(1))], 0).unwrap();

    assert_eq!(
        rolls::fulfill_randomness(player(), roll.id, 1, 1),
        Err(RouletteError::Unauthorized)
    );
    assert!(matches!(
        rolls::fulfill_randomness(oracle(), roll.id, 40, 1),
        Err(RouletteError::ValidationError(_))
    ));
    assert!(rolls::get_roll(roll.id).unwrap().is_pending());
    assert_eq!(rolls::get_last_request_id(), roll.id);
    assert_eq!(rolls::rolls_for_wallet(player(), 10).len(), 1);

    let stake: Nat = rolls::pending_stake_total();
    assert_eq!(stake, units(1));
    ledger.check_conservation().unwrap();
}
