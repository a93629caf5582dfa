//! License identification and compliance classification.
//!
//! - [`spdx`]: hand-maintained SPDX identifier → [`LicenseType`](crate::models::LicenseType)
//!   table and normalization of common non-SPDX strings.
//! - [`classifier`]: the [`Classifier`](classifier::Classifier) seam plus a small
//!   phrase-matching implementation.
//! - [`restrictiveness`]: maps the license types of one library to the
//!   redistribution obligation they impose.

pub mod classifier;
pub mod restrictiveness;
pub mod spdx;
