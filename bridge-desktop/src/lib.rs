//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `TagStore` using `lofty` (ID3v2, Vorbis Comments, MP4, FLAC) with
//!   artwork downscaling through `image`
//! - `FileWalker` using `walkdir` and a glob matcher on file names
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoftyTagStore, ReqwestHttpClient, WalkdirFileWalker};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = ReqwestHttpClient::new("tunefill/0.1", Duration::from_secs(15))?;
//!     let tags = LoftyTagStore::new();
//!     let walker = WalkdirFileWalker::new();
//!
//!     // Hand these to `core_service::CoreDependencies`
//!     Ok(())
//! }
//! ```

mod filesystem;
mod http;
mod tags;

pub use filesystem::{GlobMatcher, WalkdirFileWalker};
pub use http::ReqwestHttpClient;
pub use tags::{LoftyTagStore, MAX_ARTWORK_BYTES, MAX_ARTWORK_DIMENSION};
