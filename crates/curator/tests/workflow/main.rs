/// Integration tests for the fraud detection workflow: input gating, the
/// fraud / clean branches, registry reconciliation, failure handling and
/// concurrent runs.

mod branches;
mod concurrency;
mod failures;
mod gate;
