//! Prior-turn history carried between generation calls.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Opaque continuation state owned by the generation backend.
///
/// The conversation store never looks inside; it only keeps the latest
/// value and hands it back on the next generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorTurns(JsonValue);

impl PriorTurns {
    /// Wraps a backend-defined value.
    #[must_use]
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Returns true if no history has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    /// Borrows the wrapped value.
    #[must_use]
    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(PriorTurns::default().is_empty());
    }

    #[test]
    fn wraps_value_untouched() {
        let value = serde_json::json!([{"role": "user", "content": "hi"}]);
        let turns = PriorTurns::new(value.clone());

        assert!(!turns.is_empty());
        assert_eq!(turns.as_value(), &value);
    }
}
