//! Auth-domain identifiers, token secrets, access claims, identities, and role routing.

pub mod claims;
pub mod id;
pub mod identity;
pub mod role;
pub mod token;

pub use claims::*;
pub use id::*;
pub use identity::*;
pub use role::*;
pub use token::{pair::*, secret::*};
