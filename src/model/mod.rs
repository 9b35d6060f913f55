//! Core data model types: format paths and the artifacts flowing through a descent.

pub mod artifact;
pub mod format;
