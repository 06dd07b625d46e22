//! CLI command implementations
//!
//! Each command is implemented in its own module.

pub mod clone;
pub mod doctor;
pub mod gpu;
pub mod info;
pub mod install;
pub mod launch;
pub mod stop;
pub mod up;
