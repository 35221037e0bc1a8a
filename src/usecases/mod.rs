//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! gate's operations. Each use case is a self-contained service.
//!
//! Use cases:
//! - `CredentialStore`: encrypted credential persistence
//! - `CredentialDerivation`: L1 proof → stored L2 credential
//! - `ReadinessService`: onboarding step refresh and polling
//! - `OrderPipeline`: signed submit / cancel / list with self-healing
//! - `AccessGate`: admin token and jurisdiction checks

pub mod access_gate;
pub mod credential_store;
pub mod derivation;
pub mod order_pipeline;
pub mod readiness;

pub use access_gate::AccessGate;
pub use credential_store::{CredentialPresence, CredentialStore};
pub use derivation::{CredentialDerivation, L1Proof, StoredCredential};
pub use order_pipeline::{OrderPipeline, UpstreamFailure};
pub use readiness::{ReadinessReport, ReadinessService};
