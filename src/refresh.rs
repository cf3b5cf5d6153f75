//! Table-scoped change notification.
//!
//! Every data-bound view subscribes with the set of tables it reads; every
//! successful mutation publishes the set of tables it changed. A view
//! re-fetches iff one of its tables changed since it last rendered, so a
//! calendar edit no longer forces the proposals pipeline to re-query.
//!
//! The generation counter is monotonically increasing and shared across all
//! tables, which gives the old "no missed refresh" guarantee for free: any
//! publish that lands after a token's last refresh makes that token stale.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::store::Table;

/// A subscriber's view of the hub: its table dependency set and the last
/// generation it has seen.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    tables: Vec<Table>,
    seen: u64,
}

#[derive(Default)]
struct HubState {
    generation: u64,
    last_changed: HashMap<Table, u64>,
}

/// Process-wide invalidation hub. Held in `AppState`.
#[derive(Default)]
pub struct RefreshHub {
    state: Mutex<HubState>,
}

impl RefreshHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view's table dependencies. The token starts fresh: only
    /// mutations after this call can make it stale.
    pub fn subscribe(&self, tables: &[Table]) -> RefreshToken {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        RefreshToken {
            tables: tables.to_vec(),
            seen: state.generation,
        }
    }

    /// Record a mutation of the given tables. Returns the new generation.
    pub fn publish(&self, tables: &[Table]) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        let generation = state.generation;
        for table in tables {
            state.last_changed.insert(*table, generation);
        }
        generation
    }

    /// Whether any table in the token's dependency set changed since the
    /// token was created or last refreshed.
    pub fn is_stale(&self, token: &RefreshToken) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        token.tables.iter().any(|table| {
            state
                .last_changed
                .get(table)
                .is_some_and(|changed| *changed > token.seen)
        })
    }

    /// Mark the token as caught up; call after the view has re-fetched.
    pub fn refresh(&self, token: &mut RefreshToken) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        token.seen = state.generation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_is_not_stale() {
        let hub = RefreshHub::new();
        let token = hub.subscribe(&[Table::Advisors]);
        assert!(!hub.is_stale(&token));
    }

    #[test]
    fn test_publish_marks_dependent_token_stale() {
        let hub = RefreshHub::new();
        let token = hub.subscribe(&[Table::Advisors, Table::Departments]);

        hub.publish(&[Table::Advisors]);
        assert!(hub.is_stale(&token));
    }

    #[test]
    fn test_unrelated_mutation_does_not_invalidate() {
        let hub = RefreshHub::new();
        let calendar_view = hub.subscribe(&[Table::Calendar, Table::Events]);

        hub.publish(&[Table::Proposals]);
        assert!(!hub.is_stale(&calendar_view));
    }

    #[test]
    fn test_refresh_clears_staleness_until_next_publish() {
        let hub = RefreshHub::new();
        let mut token = hub.subscribe(&[Table::Timesheet]);

        hub.publish(&[Table::Timesheet]);
        assert!(hub.is_stale(&token));

        hub.refresh(&mut token);
        assert!(!hub.is_stale(&token));

        hub.publish(&[Table::Timesheet]);
        assert!(hub.is_stale(&token));
    }

    #[test]
    fn test_no_missed_refresh_between_check_and_refresh() {
        let hub = RefreshHub::new();
        let mut token = hub.subscribe(&[Table::Advisors]);

        hub.publish(&[Table::Advisors]);
        hub.refresh(&mut token);
        // A publish strictly after refresh() must be observed again.
        hub.publish(&[Table::Advisors]);
        assert!(hub.is_stale(&token));
    }

    #[test]
    fn test_generation_is_monotonic() {
        let hub = RefreshHub::new();
        let a = hub.publish(&[Table::Advisors]);
        let b = hub.publish(&[Table::Calendar]);
        let c = hub.publish(&[Table::Advisors]);
        assert!(a < b && b < c);
    }
}
