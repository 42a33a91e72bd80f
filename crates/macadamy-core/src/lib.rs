//! # macadamy-core
//!
//! Core types and error types for the Macadamy session layer.
//!
//! This crate provides the foundational types shared across all Macadamy crates:
//! - Identity and enriched profile records
//! - Validated user roles
//! - Organization membership rows and their typed decoding
//! - Demo session records with TTL handling
//! - The pure selected-organization validator
//! - Cross-cutting error types

pub mod demo;
pub mod errors;
pub mod identity;
pub mod organization;
pub mod profile;
pub mod role;
pub mod selection;

pub use demo::DemoSession;
pub use errors::{CoreError, DecodeError};
pub use identity::Identity;
pub use organization::{InactiveMembership, MemberOrganization};
pub use profile::Profile;
pub use role::UserRole;
pub use selection::{SelectedOrganizationValidation, resolve_selected_organization_validation};
