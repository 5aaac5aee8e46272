// Roulette odds table and bet validation

use crate::board::*;
use crate::types::*;
use candid::Nat;
use sha2::{Digest, Sha256};

const NUMBER_MULTIPLIER: u8 = 36;
const EVEN_MONEY_MULTIPLIER: u8 = 2;
const TWO_TO_ONE_MULTIPLIER: u8 = 3;

/// Payout multiplier for one bet against `outcome`: 0 if the bet loses,
/// otherwise the total return per unit staked (stake included).
///
/// Assumes the bet was validated at submission; an out-of-domain value
/// simply never matches.
pub fn multiplier(bet_type: BetType, value: u8, outcome: u8) -> u8 {
    let won = match bet_type {
        BetType::Number => is_valid_outcome(outcome) && outcome == value,
        BetType::Color => outcome != 0 && get_color(outcome).value() == value,
        BetType::Even => get_parity(outcome) == Some(value),
        BetType::Column => get_column(outcome) == Some(value),
        BetType::Dozen => get_dozen(outcome) == Some(value),
        BetType::Half => get_half(outcome) == Some(value),
    };

    if won {
        win_multiplier(bet_type)
    } else {
        0
    }
}

pub fn win_multiplier(bet_type: BetType) -> u8 {
    match bet_type {
        BetType::Number => NUMBER_MULTIPLIER,
        BetType::Column | BetType::Dozen => TWO_TO_ONE_MULTIPLIER,
        BetType::Color | BetType::Even | BetType::Half => EVEN_MONEY_MULTIPLIER,
    }
}

/// Validate a single bet
pub fn validate_bet(bet: &Bet) -> Result<(), RouletteError> {
    if bet.amount == Nat::from(0u64) {
        return Err(RouletteError::ValidationError("Bet amount must be > 0".to_string()));
    }

    let valid = match bet.bet_type {
        BetType::Number => bet.value <= MAX_OUTCOME,
        BetType::Color => bet.value == Color::Red.value() || bet.value == Color::Black.value(),
        BetType::Even | BetType::Half => bet.value <= 1,
        BetType::Column | BetType::Dozen => bet.value <= 2,
    };

    if !valid {
        return Err(RouletteError::ValidationError(format!(
            "Invalid value {} for {:?} bet",
            bet.value, bet.bet_type
        )));
    }
    Ok(())
}

/// Validate a whole roll and return its total stake.
pub fn validate_bets(bets: &[Bet]) -> Result<Nat, RouletteError> {
    if bets.is_empty() {
        return Err(RouletteError::ValidationError("No bets placed".to_string()));
    }
    if bets.len() > MAX_BETS_PER_ROLL {
        return Err(RouletteError::ValidationError(format!(
            "Maximum {} bets per roll",
            MAX_BETS_PER_ROLL
        )));
    }

    let mut total = Nat::from(0u64);
    for bet in bets {
        validate_bet(bet)?;
        total += bet.amount.clone();
    }
    Ok(total)
}

/// Evaluate a bet against the winning number
pub fn evaluate_bet(bet: &Bet, outcome: u8) -> BetResult {
    let multiplier = multiplier(bet.bet_type, bet.value, outcome);
    BetResult {
        bet_type: bet.bet_type,
        value: bet.value,
        amount: bet.amount.clone(),
        won: multiplier > 0,
        multiplier,
        payout: bet.amount.clone() * Nat::from(multiplier as u64),
    }
}

/// Evaluate every bet of a roll. Returns per-bet results and the summed payout.
pub fn evaluate_roll(bets: &[Bet], outcome: u8) -> (Vec<BetResult>, Nat) {
    let results: Vec<BetResult> = bets.iter().map(|bet| evaluate_bet(bet, outcome)).collect();
    let total = results
        .iter()
        .fold(Nat::from(0u64), |acc, r| acc + r.payout.clone());
    (results, total)
}

/// Largest total payout the roll can produce over every possible outcome.
/// Bets on one roll share a single outcome, so this is tighter than summing
/// each bet's own maximum.
pub fn worst_case_payout(bets: &[Bet]) -> Nat {
    (0..=MAX_OUTCOME)
        .map(|outcome| evaluate_roll(bets, outcome).1)
        .max()
        .unwrap_or_else(|| Nat::from(0u64))
}

/// Convert random bytes to a number 0-36.
/// Uses the first 8 bytes as u64 mod 37; the modulo bias over 2^64 is negligible.
pub fn bytes_to_outcome(bytes: &[u8]) -> Option<u8> {
    let head: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
    let val = u64::from_be_bytes(head);
    Some((val % (MAX_OUTCOME as u64 + 1)) as u8)
}

pub fn randomness_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn payout_table() -> Vec<PayoutInfo> {
    vec![
        PayoutInfo {
            bet_type: BetType::Number,
            value_range: "0-36".into(),
            payout_multiplier: NUMBER_MULTIPLIER,
            description: "Single number, including zero".into(),
        },
        PayoutInfo {
            bet_type: BetType::Color,
            value_range: "1 = Red, 2 = Black".into(),
            payout_multiplier: EVEN_MONEY_MULTIPLIER,
            description: "18 numbers by color".into(),
        },
        PayoutInfo {
            bet_type: BetType::Even,
            value_range: "0 = even, 1 = odd".into(),
            payout_multiplier: EVEN_MONEY_MULTIPLIER,
            description: "18 numbers by parity".into(),
        },
        PayoutInfo {
            bet_type: BetType::Column,
            value_range: "0-2".into(),
            payout_multiplier: TWO_TO_ONE_MULTIPLIER,
            description: "12 numbers sharing n mod 3".into(),
        },
        PayoutInfo {
            bet_type: BetType::Dozen,
            value_range: "0-2".into(),
            payout_multiplier: TWO_TO_ONE_MULTIPLIER,
            description: "1-12, 13-24 or 25-36".into(),
        },
        PayoutInfo {
            bet_type: BetType::Half,
            value_range: "0 = 1-18, 1 = 19-36".into(),
            payout_multiplier: EVEN_MONEY_MULTIPLIER,
            description: "18 numbers by half".into(),
        },
    ]
}
