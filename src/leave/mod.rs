//! Leave request rules: date overlap, duration quotas, the approval cascade
//! and status derivation. Everything here is free of I/O; the service layer
//! loads the data and persists the outcome.

pub mod cascade;
pub mod error;
pub mod overlap;
pub mod policy;
pub mod quota;
pub mod range;
pub mod service;
pub mod status;
pub mod validation;
