//! Workspace placeholder crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `openwith-workspace`
//! and enable `desktop-shims` (core plus desktop adapters) or `core` (core
//! only, every bridge injected by the host) without wiring each crate.

#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_share;
