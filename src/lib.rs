//! Toolboks - lightweight library and utility tools.
//!
//! This crate provides small, independent helpers: an INI configuration reader, XDG Base
//! Directory resolution, an environment accessor with fallbacks, a runtime context probe,
//! a nested-sequence flattener and an absolute-path filter.

pub mod config_files;
pub mod fs;
pub mod list;
pub mod os;
