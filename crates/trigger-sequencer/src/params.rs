use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// String-keyed step parameters, as supplied by operator forms and session
/// plans.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepParams(HashMap<String, String>);

impl StepParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Numeric fields from operator forms arrive partially filled; blank or
    /// unparseable input reads as zero so the session keeps moving.
    pub fn numeric_or_zero(&self, key: &str) -> f64 {
        self.0
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

impl FromIterator<(String, String)> for StepParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
