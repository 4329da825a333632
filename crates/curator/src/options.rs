use std::time::Duration;

use curator_core::config::DetectionConfig;
use curator_core::text::{DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};
use curator_core::TextGate;
use curator_embedding::index::DEFAULT_K;

/// Per-call knobs for [`FraudCurator::run_fraud_detection`](crate::FraudCurator::run_fraud_detection).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOptions {
    pub min_length: usize,
    pub max_length: usize,
    /// Similar historical cases to retrieve.
    pub k: usize,
    /// Deadline for each encoder / reasoner call.
    pub timeout: Duration,
    /// Run the summary stage on the fraud branch.
    pub summarize: bool,
    /// Add confirmed fraud cases to the index once the verdict is built.
    pub remember_cases: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            k: DEFAULT_K,
            timeout: Duration::from_secs(30),
            summarize: true,
            remember_cases: false,
        }
    }
}

impl From<&DetectionConfig> for DetectionOptions {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            k: config.k,
            timeout: Duration::from_secs(config.timeout_secs),
            summarize: config.generate_summary,
            remember_cases: config.remember_cases,
        }
    }
}

impl DetectionOptions {
    pub fn gate(&self) -> TextGate {
        TextGate::new(self.min_length, self.max_length)
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_summary(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub fn remembering_cases(mut self, remember: bool) -> Self {
        self.remember_cases = remember;
        self
    }
}
