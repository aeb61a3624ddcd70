//! Core type definitions for Keygate.
//!
//! This crate defines the fundamental types shared by the authority, the
//! device-side client, and the HTTP surface:
//! - License records and device bindings
//! - License status and push event wire types
//! - The request/response bodies of the activation protocol
//! - Audit log entries
//!
//! Nothing in here performs I/O. Policy (who may activate, when a license
//! expires) lives in `keygate-authority`; this crate only describes state.

mod audit;
mod event;
mod license;
pub mod wire;

pub use audit::{AuditAction, AuditEntry};
pub use event::PushEvent;
pub use license::{DeviceBinding, LicenseRecord, LicenseStatus};
