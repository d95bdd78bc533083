//! Credential pair and redacted secret wrappers.

pub mod pair;
pub mod secret;
