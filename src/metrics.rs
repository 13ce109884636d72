//! Passive accounting of consumed capacity and request outcomes.

use crate::transport;

use std::{collections, sync};

/// Per-operation success and failure counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationCounts {
    /// Requests that returned an error after retries were exhausted.
    pub failures: u64,
    /// Requests that completed successfully.
    pub successes: u64,
}

/// Point-in-time copy of everything the tracker has recorded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapacitySnapshot {
    /// Consumed capacity units keyed by table name.
    pub capacity_units: collections::HashMap<String, f64>,
    /// Success and failure counts keyed by operation name.
    pub operations: collections::HashMap<String, OperationCounts>,
    /// Total retry attempts across all operations.
    pub retries: u64,
}

#[derive(Debug, Default)]
struct Totals {
    capacity_units: collections::HashMap<String, f64>,
    operations: collections::HashMap<String, OperationCounts>,
    retries: u64,
}

/// Cheaply cloneable handle accumulating capacity and outcome totals.
///
/// The tracker only records what responses report. It never alters request
/// behavior and never asks the service for capacity it would not otherwise
/// return.
#[derive(Clone, Debug, Default)]
pub struct CapacityTracker {
    totals: sync::Arc<sync::Mutex<Totals>>,
}

impl CapacityTracker {
    /// Tracker with all totals at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the consumed capacity reported by a response, if any.
    pub fn record_capacity(&self, consumed: Option<&transport::ConsumedCapacity>) {
        let Some(consumed) = consumed else {
            return;
        };
        let mut totals = self.lock();
        *totals
            .capacity_units
            .entry(consumed.table_name.clone())
            .or_default() += consumed.capacity_units;
    }

    /// Record one completed request for `operation`.
    pub fn record_outcome(&self, operation: &str, succeeded: bool) {
        let mut totals = self.lock();
        let counts = totals.operations.entry(operation.to_string()).or_default();
        if succeeded {
            counts.successes += 1;
        } else {
            counts.failures += 1;
        }
    }

    /// Record one retry attempt.
    pub fn record_retry(&self) {
        self.lock().retries += 1;
    }

    /// Copy of the current totals.
    pub fn snapshot(&self) -> CapacitySnapshot {
        let totals = self.lock();
        CapacitySnapshot {
            capacity_units: totals.capacity_units.clone(),
            operations: totals.operations.clone(),
            retries: totals.retries,
        }
    }

    fn lock(&self) -> sync::MutexGuard<'_, Totals> {
        // the mutex only guards counter updates, poisoning cannot leave
        // the totals in a state worth refusing to read
        self.totals
            .lock()
            .unwrap_or_else(sync::PoisonError::into_inner)
    }
}
