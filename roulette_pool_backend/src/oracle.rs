//! Randomness oracle client.
//!
//! With an oracle canister configured, each roll sends it one
//! `request_randomness(request_id)` and the oracle later calls
//! `fulfill_randomness`. Without one, the canister plays oracle itself using
//! `raw_rand` from a one-shot timer, so the roll still settles asynchronously
//! through the same resolution path.

use ic_cdk::call::Call;
use ic_cdk::management_canister::raw_rand;
use std::time::Duration;

use crate::config::get_config;
use crate::defi_accounting::audit::log_audit;
use crate::defi_accounting::types::{sanitize_error, AuditEvent};
use crate::game::{bytes_to_outcome, randomness_hash};
use crate::rolls;

pub async fn request_randomness(request_id: u64) -> Result<(), String> {
    match get_config().oracle {
        Some(oracle) => {
            Call::unbounded_wait(oracle, "request_randomness")
                .with_arg(request_id)
                .await
                .map_err(|e| format!("Randomness request failed: {:?}", e))?;
            Ok(())
        }
        None => {
            ic_cdk_timers::set_timer(Duration::ZERO, async move {
                fulfill_from_raw_rand(request_id).await;
            });
            Ok(())
        }
    }
}

async fn fulfill_from_raw_rand(request_id: u64) {
    let random_bytes = match raw_rand().await {
        Ok(bytes) => bytes,
        Err(e) => {
            log_audit(AuditEvent::RandomnessRequestFailed {
                request_id,
                reason: sanitize_error(&format!("raw_rand failed: {:?}", e)),
            });
            return;
        }
    };

    let Some(outcome) = bytes_to_outcome(&random_bytes) else {
        log_audit(AuditEvent::RandomnessRequestFailed {
            request_id,
            reason: "Insufficient randomness".to_string(),
        });
        return;
    };

    let hash = randomness_hash(&random_bytes);
    if let Err(e) = rolls::resolve_roll(request_id, outcome, Some(hash), crate::now()) {
        log_audit(AuditEvent::SystemError {
            error: sanitize_error(&format!("Resolution of roll {} failed: {}", request_id, e)),
        });
    }
}
