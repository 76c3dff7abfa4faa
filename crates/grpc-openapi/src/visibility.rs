//! Visibility filtering by restriction labels.

use std::collections::BTreeSet;

use grpc_openapi_core::options::VisibilityRule;

/// Enabled selector set of one generation run.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    selectors: BTreeSet<String>,
}

impl Visibility {
    /// Filter enabling `selectors`.
    #[must_use]
    pub fn new(selectors: &BTreeSet<String>) -> Self {
        Self {
            selectors: selectors.clone(),
        }
    }

    /// Whether an element carrying `rule` is included.
    ///
    /// Unrestricted elements are always included; restricted ones need at
    /// least one of their labels enabled.
    #[must_use]
    pub fn allows(&self, rule: Option<&VisibilityRule>) -> bool {
        let Some(rule) = rule else {
            return true;
        };
        let mut labels = rule
            .restriction
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .peekable();
        if labels.peek().is_none() {
            return true;
        }
        labels.any(|label| self.selectors.contains(label))
    }
}
