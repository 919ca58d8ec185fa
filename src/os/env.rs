//! Snapshot of the process environment with fallback-aware lookups.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

use thiserror::Error;
use tracing::trace;

/// Immutable snapshot of environmental variables.
///
/// Lookups follow the platform rules: on Windows keys are matched case-insensitively, elsewhere
/// exactly. Reading from a snapshot instead of [`std::env::var`] keeps every lookup free of
/// races with [`std::env::set_var`], and lets callers supply their own variables.
#[derive(Debug, Clone)]
pub struct Env {
    vars: HashMap<OsString, OsString>,

    // Uppercased keys, consulted on Windows only.
    folded: HashMap<OsString, OsString>,
}

/// Errors encountered when getting environmental variable.
#[derive(Debug, Clone, Error)]
pub enum EnvStrError {
    /// Variable `$Missing.0` is not set.
    #[error("there is no environmental variable `${0:?}`")]
    Missing(OsString),

    /// Variable `$NonUTF8.0` is set, but is not an UTF-8 string.
    #[error("environmental variable `${0:?}` is not an UTF-8 string")]
    NonUTF8(OsString),
}

impl Env {
    /// Snapshot the environment of the current process.
    pub fn new() -> Self {
        Self::new_from(std::env::vars_os().collect())
    }

    /// Create [`Env`] holding exactly `vars`.
    pub fn new_from(vars: HashMap<OsString, OsString>) -> Self {
        let folded = if cfg!(windows) {
            vars.iter()
                .map(|(key, value)| (key.to_ascii_uppercase(), value.clone()))
                .collect()
        } else {
            HashMap::new()
        };
        Self { vars, folded }
    }

    /// Get raw value of variable `key`, [`None`] if it isn't set.
    ///
    /// # Examples
    /// ```rust
    /// use std::ffi::OsStr;
    /// use toolboks::os::env::Env;
    ///
    /// let env = Env::from_iter([("EDITOR", "vi")]);
    /// assert_eq!(env.get_os("EDITOR"), Some(OsStr::new("vi")));
    /// assert_eq!(env.get_os("VISUAL"), None);
    /// ```
    pub fn get_os(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = key.as_ref();
        self.vars
            .get(key)
            .or_else(|| self.folded.get(&key.to_ascii_uppercase()))
            .map(OsString::as_os_str)
    }

    /// Get value of variable `key` as UTF-8.
    ///
    /// # Errors
    ///
    /// [`EnvStrError::Missing`] if `key` isn't set, [`EnvStrError::NonUTF8`] if its value is not
    /// valid UTF-8.
    ///
    /// # Examples
    /// ```rust
    /// use toolboks::os::env::Env;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let env = Env::new();
    /// let _path = env.get("PATH")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get(&self, key: impl AsRef<OsStr>) -> Result<&str, EnvStrError> {
        let key = key.as_ref();
        self.get_os(key)
            .ok_or_else(|| EnvStrError::Missing(key.to_os_string()))?
            .to_str()
            .ok_or_else(|| EnvStrError::NonUTF8(key.to_os_string()))
    }
}

/// Result of [`Env::getenv`].
///
/// Keeps apart a variable which is missing from one which is set, but blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvValue {
    /// Non-blank value, either from the environment or from the fallback.
    Present(String),
    /// Variable is set, but its (transformed) value is blank and there was no fallback.
    Blank,
    /// Variable is not set and there was no fallback.
    Absent,
}

impl EnvValue {
    /// View as an optional string. [`EnvValue::Blank`] is `Some("")`.
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            EnvValue::Present(value) => Some(value),
            EnvValue::Blank => Some(""),
            EnvValue::Absent => None,
        }
    }

    /// Owned counterpart of [`EnvValue::as_deref`].
    pub fn into_option(self) -> Option<String> {
        match self {
            EnvValue::Present(value) => Some(value),
            EnvValue::Blank => Some(String::new()),
            EnvValue::Absent => None,
        }
    }

    /// Only the [`EnvValue::Present`] value, treating blank as missing.
    pub fn present(self) -> Option<String> {
        match self {
            EnvValue::Present(value) => Some(value),
            EnvValue::Blank | EnvValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, EnvValue::Absent)
    }
}

impl Env {
    /// Get environmental variable pointed by `key`, substituting `fallback` for missing or blank
    /// values.
    ///
    /// Blank `fallback` is the same as no fallback. Values which aren't UTF-8 are converted
    /// lossily.
    ///
    /// # Examples
    /// ```rust
    /// use toolboks::os::env::{Env, EnvValue};
    ///
    /// let env = Env::from_iter([("EMPTY", ""), ("SET", "value")]);
    /// assert_eq!(env.getenv("SET", None), EnvValue::Present("value".into()));
    /// assert_eq!(env.getenv("EMPTY", None), EnvValue::Blank);
    /// assert_eq!(env.getenv("MISSING", None), EnvValue::Absent);
    /// assert_eq!(env.getenv("EMPTY", Some("fallback")), EnvValue::Present("fallback".into()));
    /// ```
    pub fn getenv(&self, key: impl AsRef<OsStr>, fallback: Option<&str>) -> EnvValue {
        self.getenv_with(key, fallback, str::to_string)
    }

    /// Like [`Env::getenv`], but `transform` is applied to the raw value before it is checked
    /// for blankness.
    ///
    /// # Examples
    /// ```rust
    /// use toolboks::fs::filter_abs_path;
    /// use toolboks::os::env::{Env, EnvValue};
    ///
    /// let env = Env::from_iter([("DIRS", "relative:dirs")]);
    /// assert_eq!(
    ///     env.getenv_with("DIRS", Some("/etc/xdg"), filter_abs_path),
    ///     EnvValue::Present("/etc/xdg".into())
    /// );
    /// ```
    pub fn getenv_with(
        &self,
        key: impl AsRef<OsStr>,
        fallback: Option<&str>,
        transform: impl FnOnce(&str) -> String,
    ) -> EnvValue {
        let key = key.as_ref();
        let fallback = fallback.filter(|fallback| !fallback.is_empty());
        let Some(raw) = self.get_os(key) else {
            trace!(?key, ?fallback, "environmental variable is missing");
            return fallback.map_or(EnvValue::Absent, |fallback| {
                EnvValue::Present(fallback.to_string())
            });
        };
        let raw = raw.to_string_lossy();
        let value = transform(&*raw);
        if !value.is_empty() {
            return EnvValue::Present(value);
        }
        trace!(?key, ?fallback, "environmental variable is blank");
        fallback.map_or(EnvValue::Blank, |fallback| {
            EnvValue::Present(fallback.to_string())
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Env
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    /// Create [`Env`] from `(key, value)` pairs, see [`Env::new_from`].
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new_from(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
