// Nat arithmetic helpers based on KongSwap patterns
use candid::Nat;
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use num_bigint::BigUint;
use num_traits::Zero;
use std::borrow::Cow;

use crate::types::BPS_DENOMINATOR;

pub fn nat_zero() -> Nat {
    Nat::from(0u64)
}

pub fn nat_is_zero(n: &Nat) -> bool {
    n.0.is_zero()
}

// Safe subtraction - returns None if would underflow
pub fn nat_subtract(n1: &Nat, n2: &Nat) -> Option<Nat> {
    if n1 < n2 {
        None
    } else {
        Some(Nat(n1.0.clone() - n2.0.clone()))
    }
}

pub fn nat_saturating_sub(n1: &Nat, n2: &Nat) -> Nat {
    nat_subtract(n1, n2).unwrap_or_else(nat_zero)
}

// Minimum of two Nats
pub fn nat_min(n1: &Nat, n2: &Nat) -> Nat {
    if n1 <= n2 {
        n1.clone()
    } else {
        n2.clone()
    }
}

/// `amount * bps / 10_000`, rounded down.
pub fn nat_mul_bps(amount: &Nat, bps: u64) -> Nat {
    Nat(amount.0.clone() * BigUint::from(bps) / BigUint::from(BPS_DENOMINATOR))
}

/// `10^exp` as Nat.
pub fn nat_pow10(exp: u32) -> Nat {
    Nat(BigUint::from(10u32).pow(exp))
}

// Integer division - ALWAYS ROUNDS DOWN
pub fn nat_divide(numerator: &Nat, denominator: &Nat) -> Option<Nat> {
    if nat_is_zero(denominator) {
        return None;
    }
    Some(Nat(numerator.0.clone() / denominator.0.clone()))
}

pub fn nat_is_multiple_of(n: &Nat, divisor: &Nat) -> bool {
    if nat_is_zero(divisor) {
        return false;
    }
    (n.0.clone() % divisor.0.clone()).is_zero()
}

// =============================================================================
// STORABLE WRAPPER FOR NAT
// =============================================================================

/// Wrapper for Nat that implements Storable for ic-stable-structures
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorableNat(pub Nat);

impl From<Nat> for StorableNat {
    fn from(n: Nat) -> Self {
        StorableNat(n)
    }
}

impl From<StorableNat> for Nat {
    fn from(s: StorableNat) -> Self {
        s.0
    }
}

impl Storable for StorableNat {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        // Length-prefixed big-endian BigUint
        let bytes = self.0.0.to_bytes_be();
        let len = bytes.len() as u32;
        let mut result = len.to_be_bytes().to_vec();
        result.extend_from_slice(&bytes);
        Cow::Owned(result)
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        if bytes.len() < 4 {
            return StorableNat(nat_zero());
        }
        let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if bytes.len() < 4 + len {
            return StorableNat(nat_zero());
        }
        let biguint = BigUint::from_bytes_be(&bytes[4..4 + len]);
        StorableNat(Nat(biguint))
    }

    const BOUND: Bound = Bound::Unbounded;
}
