//! # Gatepass
//!
//! **Gate-access grant issuance and validation with distributed replay
//! protection.**
//!
//! Gatepass lets a mobile client prove to a physical gate scanner that
//! its holder is an active member entitled to pass, without letting a
//! captured or photographed credential be replayed and without the gate
//! hitting the primary database on every scan.
//!
//! ## Two grant variants
//!
//! - **Signed grant** — a compact Ed25519-signed token, self-describing
//!   and verifiable offline. Stronger against store unavailability,
//!   irrevocable until expiry.
//! - **Opaque grant** — a short human-typeable code whose claims live
//!   only in the shared store. Revocable server-side at any moment,
//!   dependent on the store being reachable.
//!
//! Both embed a unique grant identifier; a shared TTL store arbitrates
//! at-most-one acceptance across every validator instance via atomic
//! set-if-absent writes.
//!
//! ## Quickstart
//!
//! ```
//! use gatepass::{
//!     GatepassConfig, KeyManager, MemoryStore, StaticStatusOracle, SystemClock,
//!     TokenIssuer, TokenValidator, TracingAccessLog,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), gatepass::GatepassError> {
//!     let config = GatepassConfig {
//!         production: false,
//!         ..Default::default()
//!     };
//!     config.validate()?;
//!
//!     let clock = Arc::new(SystemClock);
//!     let keys = Arc::new(KeyManager::from_config(&config)?);
//!     let store = Arc::new(MemoryStore::new(clock.clone()));
//!     let oracle = Arc::new(StaticStatusOracle::default().with_active("member-1"));
//!
//!     let issuer = TokenIssuer::new(
//!         config.clone(),
//!         keys.clone(),
//!         store.clone(),
//!         oracle.clone(),
//!         clock.clone(),
//!     );
//!     let validator = TokenValidator::new(
//!         config,
//!         keys,
//!         store,
//!         oracle,
//!         Arc::new(TracingAccessLog),
//!         clock,
//!     );
//!
//!     let grant = issuer.issue_opaque("member-1", "gate-north", None)?;
//!     let decision = validator.resolve(&gatepass::ResolveRequest {
//!         code: grant.code,
//!         audience_declared: "gate-north".to_string(),
//!         device_id: "scanner-1".to_string(),
//!         caller_ip: None,
//!         user_agent: None,
//!     });
//!     assert!(decision.is_authorized());
//!     Ok(())
//! }
//! ```
//!
//! ## Threat model
//!
//! Gatepass protects against:
//! - **Replay** — a grant accepted once is denied on every later
//!   presentation, across processes, until its replay record expires
//! - **Algorithm confusion** — token headers are checked against an
//!   allow-list of exactly one algorithm tag
//! - **Key substitution** — tokens must name the current `kid`; rotated
//!   keys invalidate outstanding grants immediately
//! - **Fail-open on store outage** — when reuse prevention cannot be
//!   performed, validation denies rather than admits
//!
//! It does not prevent a legitimate active member from handing their
//! phone to someone else within a grant's lifetime.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Domain types
pub mod grant;
pub mod protocol;

// Key management
pub mod keys;

// Shared store / replay guard
pub mod store;

// External collaborators
pub mod audit;
pub mod status;

// Issuance and validation engines
pub mod issue;
pub mod validate;

// Re-exports for public API
pub use audit::{AccessAttempt, AccessLog, MemoryAccessLog, TracingAccessLog};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::GatepassConfig;
pub use errors::GatepassError;
pub use issue::TokenIssuer;
pub use keys::{KeyManager, KeyPair};
pub use protocol::{
    Decision, DecisionReason, OpaqueGrant, Outcome, ResolveRequest, SignedGrant, TokenVerdict,
    ValidateRequest, VerdictResult,
};
pub use status::{CachedStatusOracle, StaticStatusOracle, SubjectStatus, UserStatusOracle};
pub use store::{memory::MemoryStore, ReplayStore};
pub use validate::TokenValidator;
