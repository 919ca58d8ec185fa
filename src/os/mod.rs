//! OS-level interactions: environmental variables and host information.

pub mod env;
pub mod system;

pub use system::{SystemContext, context};
