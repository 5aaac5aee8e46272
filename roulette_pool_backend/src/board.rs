// European single-zero wheel layout

use crate::types::Color;

pub const MAX_OUTCOME: u8 = 36;

pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub const BLACK_NUMBERS: [u8; 18] = [
    2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35,
];

pub fn is_valid_outcome(n: u8) -> bool {
    n <= MAX_OUTCOME
}

pub fn get_color(n: u8) -> Color {
    if n == 0 || n > MAX_OUTCOME {
        Color::Green
    } else if RED_NUMBERS.contains(&n) {
        Color::Red
    } else {
        Color::Black
    }
}

// The helpers below return None for 0 (and out-of-range numbers):
// the green pocket belongs to no outside group.

/// Column index: 0 holds 3,6,...,36; 1 holds 1,4,...,34; 2 holds 2,5,...,35.
pub fn get_column(n: u8) -> Option<u8> {
    if n == 0 || n > MAX_OUTCOME {
        return None;
    }
    Some(n % 3)
}

/// Dozen index: 0 = 1-12, 1 = 13-24, 2 = 25-36.
pub fn get_dozen(n: u8) -> Option<u8> {
    if n == 0 || n > MAX_OUTCOME {
        return None;
    }
    Some((n - 1) / 12)
}

/// Half index: 0 = 1-18, 1 = 19-36.
pub fn get_half(n: u8) -> Option<u8> {
    if n == 0 || n > MAX_OUTCOME {
        return None;
    }
    Some((n - 1) / 18)
}

/// Parity: 0 = even, 1 = odd.
pub fn get_parity(n: u8) -> Option<u8> {
    if n == 0 || n > MAX_OUTCOME {
        return None;
    }
    Some(n % 2)
}
