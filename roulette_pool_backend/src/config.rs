//! Install-time configuration and the operator capability.
//!
//! The operator, ledger and oracle identities plus the risk and fee knobs live
//! in one stable cell. Operator-only entry points check the caller against
//! the principal stored here.

use candid::{CandidType, Deserialize, Nat, Principal};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::storable::Bound;
use ic_stable_structures::{StableCell, Storable};
use std::borrow::Cow;
use std::cell::RefCell;

use crate::defi_accounting::audit::log_audit;
use crate::defi_accounting::memory_ids::CONFIG_MEMORY_ID;
use crate::defi_accounting::types::AuditEvent;
use crate::types::*;
use crate::{Memory, MEMORY_MANAGER};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Optional install arguments; every omitted field takes its default.
#[derive(CandidType, Deserialize, Clone, Debug, Default)]
pub struct InitArgs {
    pub operator: Option<Principal>,
    pub asset_ledger: Option<Principal>,
    pub ledger_decimals: Option<u8>,
    pub ledger_fee: Option<Nat>,
    pub oracle: Option<Principal>,
    pub bet_fee_bps: Option<u64>,
    pub percentage_cap_bps: Option<u64>,
    pub fixed_cap: Option<Nat>,
    pub redeem_timelock_secs: Option<u64>,
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub operator: Principal,
    pub asset_ledger: Principal,
    /// Decimals of the asset ledger; internal amounts always carry 18.
    pub ledger_decimals: u8,
    /// Ledger transfer fee in ledger units, paid from the collected fees.
    pub ledger_fee: Nat,
    /// `None` = management canister `raw_rand`.
    pub oracle: Option<Principal>,
    pub bet_fee_bps: u64,
    pub percentage_cap_bps: u64,
    pub fixed_cap: Nat,
    pub redeem_timelock_ns: u64,
}

impl Config {
    pub fn from_init_args(args: InitArgs, installer: Principal) -> Result<Self, RouletteError> {
        let asset_ledger = match args.asset_ledger {
            Some(ledger) => ledger,
            None => Principal::from_text(CKUSDT_CANISTER_ID)
                .map_err(|e| RouletteError::ValidationError(format!("Invalid ledger id: {:?}", e)))?,
        };
        let config = Self {
            operator: args.operator.unwrap_or(installer),
            asset_ledger,
            ledger_decimals: args.ledger_decimals.unwrap_or(CKUSDT_DECIMALS),
            ledger_fee: args.ledger_fee.unwrap_or_else(|| Nat::from(CKUSDT_TRANSFER_FEE)),
            oracle: args.oracle,
            bet_fee_bps: args.bet_fee_bps.unwrap_or(DEFAULT_BET_FEE_BPS),
            percentage_cap_bps: args.percentage_cap_bps.unwrap_or(DEFAULT_PERCENTAGE_CAP_BPS),
            fixed_cap: args.fixed_cap.unwrap_or_else(|| units(DEFAULT_FIXED_CAP_UNITS)),
            redeem_timelock_ns: args
                .redeem_timelock_secs
                .unwrap_or(DEFAULT_REDEEM_TIMELOCK_SECS)
                .saturating_mul(NANOS_PER_SEC),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RouletteError> {
        if self.ledger_decimals as u32 > DECIMALS {
            return Err(RouletteError::ValidationError(format!(
                "Ledger decimals {} exceed internal precision {}",
                self.ledger_decimals, DECIMALS
            )));
        }
        validate_bps("bet fee", self.bet_fee_bps)?;
        validate_bps("percentage cap", self.percentage_cap_bps)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operator: Principal::anonymous(),
            asset_ledger: Principal::management_canister(),
            ledger_decimals: DECIMALS as u8,
            ledger_fee: Nat::from(0u64),
            oracle: None,
            bet_fee_bps: DEFAULT_BET_FEE_BPS,
            percentage_cap_bps: DEFAULT_PERCENTAGE_CAP_BPS,
            fixed_cap: units(DEFAULT_FIXED_CAP_UNITS),
            redeem_timelock_ns: DEFAULT_REDEEM_TIMELOCK_SECS * NANOS_PER_SEC,
        }
    }
}

impl Storable for Config {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect("CRITICAL: Failed to encode Config"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode Config from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade."
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

thread_local! {
    static CONFIG: RefCell<StableCell<Config, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(CONFIG_MEMORY_ID))),
            Config::default()
        )
    );
}

fn validate_bps(name: &str, bps: u64) -> Result<(), RouletteError> {
    if bps > BPS_DENOMINATOR {
        return Err(RouletteError::ValidationError(format!(
            "{} of {} bps exceeds {}",
            name, bps, BPS_DENOMINATOR
        )));
    }
    Ok(())
}

pub fn get_config() -> Config {
    CONFIG.with(|c| c.borrow().get().clone())
}

pub fn set_config(config: Config) {
    CONFIG.with(|c| {
        c.borrow_mut().set(config);
    });
}

pub fn require_operator(caller: Principal) -> Result<(), RouletteError> {
    if caller != get_config().operator {
        return Err(RouletteError::Unauthorized);
    }
    Ok(())
}

/// Only the configured oracle canister may deliver outcomes.
pub fn require_oracle(caller: Principal) -> Result<(), RouletteError> {
    match get_config().oracle {
        Some(oracle) if oracle == caller => Ok(()),
        _ => Err(RouletteError::Unauthorized),
    }
}

pub fn get_bet_fee() -> u64 {
    get_config().bet_fee_bps
}

pub fn set_bet_fee(caller: Principal, bps: u64) -> Result<(), RouletteError> {
    require_operator(caller)?;
    validate_bps("bet fee", bps)?;

    let mut config = get_config();
    let old_bps = config.bet_fee_bps;
    config.bet_fee_bps = bps;
    set_config(config);

    log_audit(AuditEvent::BetFeeChanged { old_bps, new_bps: bps });
    Ok(())
}
