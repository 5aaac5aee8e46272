use candid::Principal;
use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::types::RouletteError;

thread_local! {
    static PENDING_OPERATIONS: RefCell<BTreeSet<Principal>> = RefCell::new(BTreeSet::new());
}

/// Guard to prevent concurrent async operations from the same caller.
/// Held across the ledger await; released on drop.
pub struct OperationGuard {
    caller: Principal,
}

impl OperationGuard {
    /// Returns error if caller already has a pending operation
    pub fn new(caller: Principal) -> Result<Self, RouletteError> {
        PENDING_OPERATIONS.with(|ops| {
            let mut ops = ops.borrow_mut();
            if !ops.insert(caller) {
                return Err(RouletteError::OperationInProgress);
            }
            Ok(Self { caller })
        })
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        PENDING_OPERATIONS.with(|ops| {
            ops.borrow_mut().remove(&self.caller);
        });
    }
}
