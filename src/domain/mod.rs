//! Domain layer - Core types and pure rules.
//!
//! Identifiers, credentials, readiness steps, order envelopes and the
//! error taxonomy. No I/O here (hexagonal architecture inner ring).

pub mod credential;
pub mod error;
pub mod ids;
pub mod order;
pub mod readiness;

pub use credential::{BoundCredential, Credential, CredentialPayload, CredentialTriple};
pub use error::GateError;
pub use ids::{ApiKey, OwnerKey, UserId, WalletAddress};
pub use order::{ClientOrderRequest, OrderEnvelope, OrderSide, OrderType, SignedOrder};
pub use readiness::{ReadinessState, ReadinessStep};
