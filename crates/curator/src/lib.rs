pub mod options;
pub mod pipeline;
pub mod registry;

pub use options::DetectionOptions;
pub use pipeline::FraudCurator;
pub use registry::{FraudTypeRegistry, Registration};

pub use curator_core::{CuratorError, Verdict};

/// Run one report through `curator`'s detection workflow.
pub async fn run_fraud_detection(
    curator: &FraudCurator,
    text: &str,
    options: &DetectionOptions,
) -> Result<Verdict, CuratorError> {
    curator.run_fraud_detection(text, options).await
}
