//! Thin REST wrappers layered on the gateway.
//!
//! [`session`] drives the token lifecycle (login, OTP verification, logout); [`resources`]
//! exposes typed paths for the marketplace resources. Payload schemas belong to the backend,
//! so every resource helper is generic over caller-defined serde types.

pub mod resources;
pub mod session;

pub use resources::*;
pub use session::*;
