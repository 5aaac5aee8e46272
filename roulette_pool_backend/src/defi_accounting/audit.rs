use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::{StableBTreeMap, StableCell};
use std::cell::RefCell;

use crate::{Memory, MEMORY_MANAGER};
use super::memory_ids::{AUDIT_LOG_COUNTER_MEMORY_ID, AUDIT_LOG_MAP_MEMORY_ID};
use super::types::{AuditEntry, AuditEvent};

thread_local! {
    // Audit trail keyed by a monotonically increasing index
    // (unbounded - monitor size via admin_get_audit_log_count)
    static AUDIT_LOG: RefCell<StableBTreeMap<u64, AuditEntry, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(AUDIT_LOG_MAP_MEMORY_ID)))
        )
    );

    static AUDIT_LOG_COUNTER: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(AUDIT_LOG_COUNTER_MEMORY_ID))),
            0u64
        )
    );
}

pub fn log_audit(event: AuditEvent) {
    crate::log!("audit: {:?}", event);
    let index = AUDIT_LOG_COUNTER.with(|counter| {
        let mut counter = counter.borrow_mut();
        let index = *counter.get();
        counter.set(index + 1);
        index
    });
    AUDIT_LOG.with(|log| {
        log.borrow_mut().insert(index, AuditEntry {
            timestamp: crate::now(),
            event,
        });
    });
}

pub fn get_audit_count() -> u64 {
    AUDIT_LOG_COUNTER.with(|c| *c.borrow().get())
}

/// Most recent entries first.
pub fn get_audit_entries(limit: u64, offset: u64) -> Vec<AuditEntry> {
    let newest_first = (0..get_audit_count()).rev().skip(offset as usize).take(limit as usize);
    AUDIT_LOG.with(|log| {
        let log = log.borrow();
        newest_first.filter_map(|index| log.get(&index)).collect()
    })
}
