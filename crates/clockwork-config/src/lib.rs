//! # Clockwork Config
//!
//! Connection descriptors for the four supported engines, the normalizer that
//! turns untrusted input into a complete descriptor, and layered application
//! configuration from files, environment variables and `.env`.

mod app_config;
mod descriptor;
mod env;
mod loader;
mod normalizer;
mod validation;

pub use app_config::*;
pub use descriptor::*;
pub use env::*;
pub use loader::*;
pub use normalizer::*;
pub use validation::*;
