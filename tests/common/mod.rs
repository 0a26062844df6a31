//! Common test utilities and helpers.
//!
//! This module provides shared functionality for the integration tests:
//! - Custom assertions over redacted output
//! - PDF fixtures built with printpdf
//! - Text extraction and inspection helpers

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod pdf_helpers;

pub use assertions::*;
pub use fixtures::*;
pub use pdf_helpers::*;
