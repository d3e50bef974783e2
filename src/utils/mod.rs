//! Shared helpers for input normalization and validation.

pub mod validation;
