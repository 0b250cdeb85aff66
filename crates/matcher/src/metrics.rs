// Metrics hooks for the `matcher` crate.
//
// Callers install a global `MatchMetrics` implementation via [`set_match_metrics`];
// every `Matcher` operation then reports its latency and result count.
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Engine operation being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOperation {
    /// Prompt → ranked wardrobe outfits.
    Recommend,
    /// Wardrobe anchor → marketplace items.
    MarketplaceMatches,
    /// Marketplace item → wardrobe items.
    WardrobeMatches,
}

impl MatchOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchOperation::Recommend => "recommend",
            MatchOperation::MarketplaceMatches => "marketplace_matches",
            MatchOperation::WardrobeMatches => "wardrobe_matches",
        }
    }
}

impl fmt::Display for MatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics observer for engine operations.
pub trait MatchMetrics: Send + Sync {
    /// Record a successful operation.
    ///
    /// `latency` is the wall-clock time of the whole operation, embedding call
    /// included, and `result_count` the number of outfits or items returned.
    fn record_match(&self, operation: MatchOperation, latency: Duration, result_count: usize);

    /// Record a failed operation. The default ignores failures.
    fn record_failure(&self, _operation: MatchOperation, _latency: Duration) {}
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global match metrics recorder.
///
/// Typically called once at startup so every `Matcher` shares one backend.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
