//! # smprofile-core: Foundational Types
//!
//! Leaf crate of the smprofile workspace. Defines the primitives every other
//! crate builds on.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** Profile namespaces travel as
//!    [`ProfileId`], normalized once at construction. Reference lookups compare
//!    normalized identifiers, never raw strings.
//!
//! 2. **Construction errors are typed.** A profile document that cannot be
//!    turned into a model fails with [`ProfileError`] before any validation
//!    runs. Validation itself never returns `Err`.
//!
//! 3. **Format checks live here.** Timestamp and GUID parsing for the strict
//!    format policy is centralized in [`temporal`] and [`identity`] so the
//!    schema crate never parses text formats itself.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `smprofile-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ProfileError;
pub use identity::{is_guid, ProfileId};
pub use temporal::{is_iso8601_datetime, is_utc_timestamp};
