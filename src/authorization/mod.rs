//! Actor Authorization
//!
//! Maps the roles carried by a caller onto the capabilities governance
//! commands check for.

pub mod capabilities;
pub mod token;

pub use capabilities::{Actor, Capability, Role};
pub use token::{decode_actor, issue_token, Claims};
