//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates. Hosts that only need the resolution engine can depend on
//! `tunefill-workspace` with `metadata-only`; the default `desktop-shims`
//! feature pulls in the full `core-service` façade with desktop bridges.

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "metadata-only")]
pub use core_metadata;
