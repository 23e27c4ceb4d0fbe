//! # Host Bridge Traits
//!
//! Collaborator contracts that the resolution core consumes but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP requests with per-request timeouts
//! - [`TagStore`](tags::TagStore) - Read and write lyrics/artwork tags on audio files
//! - [`FileWalker`](discovery::FileWalker) - Enumerate candidate audio files under a directory
//!
//! Desktop implementations live in `bridge-desktop`. Tests substitute
//! `mockall` doubles for any of them.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific errors into it and keep the offending path
//! or URL in the message.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; a single instance is shared by all
//! batch workers.

pub mod discovery;
pub mod error;
pub mod http;
pub mod tags;

pub use error::BridgeError;

pub use discovery::{DiscoveryRequest, FileWalker};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use tags::{TagStore, TagUpdates, TrackTags};
