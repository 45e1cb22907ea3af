//! CLI command implementations.

pub mod build;
pub mod clean;
pub mod doctor;
pub mod init;
pub mod install;
pub mod package;
pub mod resolve;
pub mod target;
