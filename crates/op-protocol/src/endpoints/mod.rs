//! Endpoint orchestration.
//!
//! These are the transport-agnostic counterparts of the HTTP endpoints:
//! the host decodes parameters, calls in, and turns the returned
//! structures (consent prompts, redirect descriptors, token responses,
//! errors) into wire responses.

mod authorization;
mod token;
mod userinfo;

pub use authorization::{AuthorizationEndpoint, AuthorizeOutcome, RedirectDescriptor};
pub use token::TokenEndpoint;
pub use userinfo::UserInfoEndpoint;
