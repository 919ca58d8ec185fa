//! Filesystem path utilities.
//!
//! Provides helpers for working with colon-delimited path lists, see [`filter_abs_path`].

pub mod path_list;

pub use path_list::{filter_abs_path, split_paths};
