//! mockidp - a tape-replaying mock of an identity provider's HTTP API.
//!
//! Requests are standardized, matched to recorded tapes by content hash, and
//! answered from the tape. Misses are explained with a diagnostic listing the
//! tapes that could have matched.

pub mod cli;
mod runtime;

#[doc(hidden)]
pub use mockidp_core;
#[doc(hidden)]
pub use mockidp_runtime;

pub use runtime::prelude;
pub use runtime::{MockIdp, MockIdpBuilder};
