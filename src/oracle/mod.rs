//! Equality oracle: structural, literal and JSON comparison.

pub mod equality;
pub mod json;
