//! Core utilities for qlbridge.
//!
//! This crate provides foundational types shared by the other crates:
//! - `span`: Source spans and line/column locations
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use span::{LineIndex, Location, Span};
