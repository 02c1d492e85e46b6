//! Global retry budget.
//!
//! Caps the ratio of retries to first attempts within a rolling window so
//! a failing dependency sees backed-off retries, not a retry storm.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Window over which the request/retry counters accumulate.
const BUDGET_WINDOW: Duration = Duration::from_secs(10);

struct BudgetState {
    window_start: Instant,
    requests: u64,
    retries: u64,
}

/// Shared retry budget across all requests of one client.
pub struct RetryBudget {
    ratio: f32,
    min_retries_per_window: u64,
    state: Mutex<BudgetState>,
}

impl RetryBudget {
    /// `ratio` is the fraction of observed requests that may be retries;
    /// `min_retries_per_window` keeps low-traffic clients from starving.
    pub fn new(ratio: f32, min_retries_per_window: u64) -> Self {
        Self {
            ratio,
            min_retries_per_window,
            state: Mutex::new(BudgetState {
                window_start: Instant::now(),
                requests: 0,
                retries: 0,
            }),
        }
    }

    /// Record a first attempt, growing the budget.
    pub fn record_request(&self) {
        let mut state = self.state.lock().expect("retry budget mutex poisoned");
        self.roll_window(&mut state);
        state.requests += 1;
    }

    /// Try to spend one retry from the budget.
    pub fn try_spend(&self) -> bool {
        let mut state = self.state.lock().expect("retry budget mutex poisoned");
        self.roll_window(&mut state);

        let allowed = ((state.requests as f64 * self.ratio as f64) as u64)
            .max(self.min_retries_per_window);
        if state.retries < allowed {
            state.retries += 1;
            true
        } else {
            false
        }
    }

    fn roll_window(&self, state: &mut BudgetState) {
        if state.window_start.elapsed() >= BUDGET_WINDOW {
            state.window_start = Instant::now();
            state.requests = 0;
            state.retries = 0;
        }
    }
}
