//! NeerOrbit API client
//!
//! Bearer-authenticated access to the NeerOrbit flood management backend.
//! Session tokens live in a pluggable [`TokenStore`]; an expired access token
//! is refreshed once and the rejected request retried once.

pub mod client;
pub mod endpoints;
pub mod token_store;
pub mod types;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder, RequestOptions};
#[cfg(not(target_arch = "wasm32"))]
pub use token_store::FileTokenStore;
#[cfg(target_arch = "wasm32")]
pub use token_store::LocalStorageTokenStore;
pub use token_store::{MemoryTokenStore, TokenStore};
pub use types::{CrowdsourceReport, HelpRequest, LoginTokens, Urgency};
