//! Auth-domain token models: the redacted access token, its owned state, and idempotency keys.

pub mod idempotency;
pub mod state;
pub mod token;

pub use idempotency::*;
pub use state::*;
pub use token::*;
