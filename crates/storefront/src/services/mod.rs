//! Services that talk to external systems.
//!
//! - `auth` - Access token verification against the auth provider and
//!   profile provisioning on first sign-in
//! - `assistant` - Natural-language product search through a chat completions API

pub mod assistant;
pub mod auth;
