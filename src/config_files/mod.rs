//! Configuration file utilities and standard directory paths.
//!
//! Provides an INI reader and helpers for locating configuration files, including XDG Base
//! Directory support.
//!
//! ```rust,no_run
//! # use toolboks::config_files::{ini, xdg};
//! # use toolboks::os::env::Env;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let env = Env::new();
//!
//! let config_path = xdg::config_home(&env)?.join("toolboks").join("config.ini");
//! let config = ini::read_ini(config_path)?;
//! # Ok(())
//! # }
//! ```

pub mod ini;
pub mod xdg;

pub use ini::{Config, ConfigError, read_config};
