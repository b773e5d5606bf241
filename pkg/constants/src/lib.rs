//! Centralized constants for the rootca project.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod paths;
pub mod secret;
pub mod state;
