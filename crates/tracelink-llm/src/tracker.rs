//! Bookkeeping for oracle calls

use std::collections::BTreeMap;

/// Per-purpose call counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallStats {
    /// Successful calls
    pub calls: usize,
    /// Failed calls (after retries)
    pub failures: usize,
    /// Characters sent in prompts
    pub prompt_chars: usize,
    /// Characters received in responses
    pub response_chars: usize,
}

/// Records oracle usage, grouped by purpose (e.g. `link_selection`)
#[derive(Debug, Clone, Default)]
pub struct ApiCallTracker {
    by_purpose: BTreeMap<String, CallStats>,
}

impl ApiCallTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful call
    pub fn record_call(&mut self, purpose: &str, prompt_chars: usize, response_chars: usize) {
        let stats = self.by_purpose.entry(purpose.to_string()).or_default();
        stats.calls += 1;
        stats.prompt_chars += prompt_chars;
        stats.response_chars += response_chars;
    }

    /// Record a call that failed after retries
    pub fn record_failure(&mut self, purpose: &str, prompt_chars: usize) {
        let stats = self.by_purpose.entry(purpose.to_string()).or_default();
        stats.failures += 1;
        stats.prompt_chars += prompt_chars;
    }

    /// Counters for one purpose
    pub fn stats(&self, purpose: &str) -> Option<&CallStats> {
        self.by_purpose.get(purpose)
    }

    /// Successful calls across all purposes
    pub fn total_calls(&self) -> usize {
        self.by_purpose.values().map(|s| s.calls).sum()
    }

    /// Failed calls across all purposes
    pub fn total_failures(&self) -> usize {
        self.by_purpose.values().map(|s| s.failures).sum()
    }

    /// Fold another tracker into this one
    pub fn merge(&mut self, other: &ApiCallTracker) {
        for (purpose, theirs) in &other.by_purpose {
            let ours = self.by_purpose.entry(purpose.clone()).or_default();
            ours.calls += theirs.calls;
            ours.failures += theirs.failures;
            ours.prompt_chars += theirs.prompt_chars;
            ours.response_chars += theirs.response_chars;
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Oracle Usage Summary".to_string(),
            "====================".to_string(),
            format!("Total calls: {}", self.total_calls()),
            format!("Total failures: {}", self.total_failures()),
        ];

        for (purpose, stats) in &self.by_purpose {
            lines.push(format!(
                "  {}: {} calls, {} failures, {} chars in, {} chars out",
                purpose, stats.calls, stats.failures, stats.prompt_chars, stats.response_chars
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_totals() {
        let mut tracker = ApiCallTracker::new();
        tracker.record_call("link_selection", 100, 20);
        tracker.record_call("link_selection", 50, 10);
        tracker.record_failure("gap_reasoning", 30);

        let stats = tracker.stats("link_selection").unwrap();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.prompt_chars, 150);
        assert_eq!(stats.response_chars, 30);
        assert_eq!(tracker.total_calls(), 2);
        assert_eq!(tracker.total_failures(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = ApiCallTracker::new();
        a.record_call("link_selection", 10, 1);
        let mut b = ApiCallTracker::new();
        b.record_call("link_selection", 5, 1);
        b.record_failure("gap_reasoning", 3);

        a.merge(&b);
        assert_eq!(a.stats("link_selection").unwrap().calls, 2);
        assert_eq!(a.total_failures(), 1);
    }

    #[test]
    fn test_summary() {
        let mut tracker = ApiCallTracker::new();
        tracker.record_call("link_selection", 100, 20);
        let summary = tracker.summary();
        assert!(summary.contains("Total calls: 1"));
        assert!(summary.contains("link_selection: 1 calls"));
    }
}
