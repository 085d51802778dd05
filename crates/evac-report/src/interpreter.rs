//! The `ReportInterpreter` capability.

use serde::{Deserialize, Serialize};

use evac_core::{Category, Severity};

use crate::ReportResult;

/// What a blockage report is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Raw location mention, or `None` if nothing could be extracted.
    pub location:        Option<String>,
    pub severity:        Severity,
    pub category:        Category,
    /// `true` for HIGH and CRITICAL reports.
    pub needs_immediate: bool,
}

impl Interpretation {
    pub fn new(location: Option<String>, severity: Severity, category: Category) -> Self {
        Self {
            location,
            severity,
            category,
            needs_immediate: severity >= Severity::High,
        }
    }
}

/// Interprets free-text blockage reports.
///
/// `reporter` is the key of the waypoint the reporter is standing on, if
/// known.  Implementations are chosen when the service is built; the
/// service never inspects which one it holds.
///
/// # Thread safety
///
/// Reports from different sessions are interpreted concurrently, so
/// implementations must be `Send + Sync`.
pub trait ReportInterpreter: Send + Sync {
    fn interpret(&self, message: &str, reporter: Option<&str>) -> ReportResult<Interpretation>;

    /// Short name for log lines.
    fn name(&self) -> &'static str;
}
