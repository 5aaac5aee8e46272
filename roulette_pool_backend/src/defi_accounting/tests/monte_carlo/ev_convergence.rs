//! Expected Value Convergence Tests
//!
//! A single-zero wheel pays every bet type 36/37 of the stake on average,
//! a house edge of 1/37. These tests check that exactly, then by sampling
//! outcomes the same way the canister derives them from VRF bytes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::MAX_OUTCOME;
use crate::game::{bytes_to_outcome, evaluate_roll, multiplier, worst_case_payout};
use crate::types::*;

const POCKETS: u64 = MAX_OUTCOME as u64 + 1;
const EXPECTED_EV: f64 = 36.0 / 37.0;
const EV_TOLERANCE: f64 = 0.015;

/// Every placement the wheel accepts.
fn all_placements() -> Vec<(BetType, u8)> {
    let mut placements: Vec<(BetType, u8)> = (0..=MAX_OUTCOME).map(|v| (BetType::Number, v)).collect();
    placements.extend([1, 2].map(|v| (BetType::Color, v)));
    placements.extend([0, 1].map(|v| (BetType::Even, v)));
    placements.extend([0, 1].map(|v| (BetType::Half, v)));
    placements.extend([0, 1, 2].map(|v| (BetType::Column, v)));
    placements.extend([0, 1, 2].map(|v| (BetType::Dozen, v)));
    placements
}

fn sample_outcome(rng: &mut ChaCha8Rng) -> u8 {
    let bytes: [u8; 32] = rng.gen();
    bytes_to_outcome(&bytes).expect("32 bytes always yield an outcome")
}

// ============================================================================
// THEORETICAL VERIFICATION TESTS
// ============================================================================

/// Sum of multipliers over all 37 pockets is 36 for every placement.
#[test]
fn test_theoretical_ev_is_exactly_36_over_37() {
    for (bet_type, value) in all_placements() {
        let total: u64 = (0..=MAX_OUTCOME)
            .map(|outcome| multiplier(bet_type, value, outcome) as u64)
            .sum();
        assert_eq!(
            total, 36,
            "{:?} {}: multipliers sum to {} over {} pockets",
            bet_type, value, total, POCKETS
        );
    }
}

#[test]
fn test_zero_loses_every_outside_bet() {
    for (bet_type, value) in all_placements() {
        let expected = if bet_type == BetType::Number && value == 0 { 36 } else { 0 };
        assert_eq!(multiplier(bet_type, value, 0), expected, "{:?} {}", bet_type, value);
    }
}

// ============================================================================
// MONTE CARLO SIMULATION TESTS
// ============================================================================

/// Even-money and dozen bets converge to 36/37 over 200k spins.
#[test]
fn test_ev_convergence_200k_spins() {
    const SAMPLES: usize = 200_000;
    let mut rng = ChaCha8Rng::seed_from_u64(42); // Fixed seed for reproducibility

    let tracked = [
        (BetType::Color, 1),
        (BetType::Even, 0),
        (BetType::Half, 1),
        (BetType::Dozen, 2),
        (BetType::Column, 0),
    ];
    let mut returned = [0u64; 5];

    for _ in 0..SAMPLES {
        let outcome = sample_outcome(&mut rng);
        for (slot, &(bet_type, value)) in tracked.iter().enumerate() {
            returned[slot] += multiplier(bet_type, value, outcome) as u64;
        }
    }

    for (slot, &(bet_type, value)) in tracked.iter().enumerate() {
        let empirical_ev = returned[slot] as f64 / SAMPLES as f64;
        println!("{:?} {}: empirical EV {:.5}", bet_type, value, empirical_ev);
        assert!(
            (empirical_ev - EXPECTED_EV).abs() < EV_TOLERANCE,
            "{:?} {}: EV {} deviates more than {} from {}",
            bet_type, value, empirical_ev, EV_TOLERANCE, EXPECTED_EV
        );
    }
}

/// Every pocket comes up close to 1/37 of the time.
#[test]
fn test_outcome_distribution_is_uniform() {
    const SAMPLES: usize = 370_000;
    let mut rng = ChaCha8Rng::seed_from_u64(12345);
    let mut counts = [0u64; POCKETS as usize];

    for _ in 0..SAMPLES {
        counts[sample_outcome(&mut rng) as usize] += 1;
    }

    let expected = SAMPLES as f64 / POCKETS as f64;
    let chi_squared: f64 = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();

    println!("Chi-squared over {} pockets: {:.2}", POCKETS, chi_squared);
    // 36 degrees of freedom; 80 is far beyond the 0.9999 quantile
    assert!(chi_squared < 80.0, "outcome distribution skewed: chi2 = {}", chi_squared);
    assert!(counts.iter().all(|&c| c > 0));
}

/// Random multi-bet rolls never pay more than the reserved worst case.
#[test]
fn test_worst_case_bounds_every_sampled_roll() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let placements = all_placements();

    for _ in 0..2_000 {
        let count = rng.gen_range(1..=MAX_BETS_PER_ROLL);
        let bets: Vec<Bet> = (0..count)
            .map(|_| {
                let (bet_type, value) = placements[rng.gen_range(0..placements.len())];
                Bet {
                    bet_type,
                    value,
                    amount: candid::Nat::from(rng.gen_range(1..1_000u64)),
                }
            })
            .collect();

        let bound = worst_case_payout(&bets);
        let outcome = sample_outcome(&mut rng);
        let (_, payout) = evaluate_roll(&bets, outcome);
        assert!(payout <= bound, "payout {} above worst case {}", payout, bound);
    }
}
