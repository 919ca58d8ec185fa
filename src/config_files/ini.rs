//! INI configuration files.
//!
//! Supported syntax:
//! ```ini
//! # full-line comments start with `#` or `;`
//! [section]
//! key = value
//! other: value
//! multiline = first line
//!     continued line
//!
//! [DEFAULT]
//! inherited = by every section
//! ```
//!
//! Keys are case-insensitive and stored lowercased, section names are case-sensitive. Values
//! are always kept as raw, trimmed strings.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Name of the section whose options are inherited by every other section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

const COMMENT_PREFIXES: &[char] = &['#', ';'];

/// Generic form of a configuration: section name to key to value.
pub type ConfigMap = BTreeMap<String, BTreeMap<String, String>>;

/// Errors encountered when reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file `{}` does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read configuration file `{}`", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
}

/// What was wrong with a line of INI syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("`{0}` appears before any section header")]
    MissingSectionHeader(String),

    #[error("malformed section header `{0}`")]
    InvalidSectionHeader(String),

    #[error("section `{0}` already exists")]
    DuplicateSection(String),

    #[error("option `{key}` in section `{section}` already exists")]
    DuplicateOption { section: String, key: String },

    #[error("expected `key = value` or `key: value`, found `{0}`")]
    MissingDelimiter(String),

    #[error("missing key in `{0}`")]
    EmptyKey(String),
}

/// Single `[section]` of an [`Ini`], with options in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get value of option `key`, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over `(key, value)` pairs, in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn value_mut(&mut self, index: usize) -> Option<&mut String> {
        self.entries.get_mut(index).map(|(_, value)| value)
    }
}

/// Structured form of a configuration: ordered sections of ordered options.
///
/// Options of the [`DEFAULT_SECTION`] are already merged into every section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ini {
    defaults: Section,
    sections: Vec<Section>,
}

impl Ini {
    /// Get section named `name`. The [`DEFAULT_SECTION`] is available only via
    /// [`Ini::defaults`].
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn defaults(&self) -> &Section {
        &self.defaults
    }

    /// Shorthand for `self.section(section)?.get(key)`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    /// Convert into the generic [`ConfigMap`] form.
    pub fn into_map(self) -> ConfigMap {
        self.sections
            .into_iter()
            .map(|section| (section.name, section.entries.into_iter().collect()))
            .collect()
    }
}

/// Configuration returned by [`read_config`], in the requested form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Config {
    Record(Ini),
    Map(ConfigMap),
}

impl Config {
    /// Get value of option `key` in `section`, regardless of the form.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        match self {
            Config::Record(ini) => ini.get(section, key),
            Config::Map(map) => map
                .get(section)?
                .get(&key.to_lowercase())
                .map(String::as_str),
        }
    }
}

/// Read configuration file `path`, returning it as a [`ConfigMap`] if `as_map` is `true`, or as
/// an [`Ini`] otherwise.
///
/// # Errors
///
/// See [`read_ini`].
pub fn read_config(path: impl AsRef<Path>, as_map: bool) -> Result<Config, ConfigError> {
    let ini = read_ini(path)?;
    Ok(if as_map {
        Config::Map(ini.into_map())
    } else {
        Config::Record(ini)
    })
}

/// Read configuration file `path` as a [`ConfigMap`].
///
/// # Errors
///
/// See [`read_ini`].
pub fn read_map(path: impl AsRef<Path>) -> Result<ConfigMap, ConfigError> {
    read_ini(path).map(Ini::into_map)
}

/// Read and parse configuration file `path`.
///
/// # Errors
///
/// [`ConfigError::NotFound`] if `path` is not an existing regular file,
/// [`ConfigError::Io`] if it can't be read, [`ConfigError::Parse`] if it isn't valid INI.
///
/// # Examples
///
/// ```rust,no_run
/// # use toolboks::config_files::ini::read_ini;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = read_ini("settings.ini")?;
/// let timeout = config.get("network", "timeout");
/// # Ok(())
/// # }
/// ```
pub fn read_ini(path: impl AsRef<Path>) -> Result<Ini, ConfigError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "reading configuration file");
    parse_ini(&content)
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Defaults,
    Section(usize),
}

/// Parse INI `content`.
///
/// # Errors
///
/// [`ConfigError::Parse`] pointing at the first offending line.
///
/// # Examples
///
/// ```rust
/// use toolboks::config_files::ini::parse_ini;
///
/// let ini = parse_ini("[server]\nPort = 8080\nhost: localhost\n").unwrap();
/// assert_eq!(ini.get("server", "port"), Some("8080"));
/// assert_eq!(ini.get("server", "HOST"), Some("localhost"));
/// ```
pub fn parse_ini(content: &str) -> Result<Ini, ConfigError> {
    let mut defaults = Section::new(DEFAULT_SECTION);
    let mut sections: Vec<Section> = Vec::new();
    let mut cursor: Option<Cursor> = None;
    let mut last_key: Option<usize> = None;
    let mut indent = 0;
    let mut pending_blanks = 0;

    for (index, line) in content.lines().enumerate() {
        let line_num = index + 1;
        let trimmed = line.trim();

        if trimmed.starts_with(COMMENT_PREFIXES) {
            continue;
        }
        if trimmed.is_empty() {
            if last_key.is_some() {
                pending_blanks += 1;
            }
            continue;
        }

        let line_indent = line.len() - line.trim_start().len();
        if let (Some(cursor), Some(key)) = (cursor, last_key)
            && line_indent > indent
        {
            let section = match cursor {
                Cursor::Defaults => &mut defaults,
                Cursor::Section(idx) => &mut sections[idx],
            };
            if let Some(value) = section.value_mut(key) {
                value.push_str(&"\n".repeat(pending_blanks + 1));
                value.push_str(trimmed);
            }
            pending_blanks = 0;
            continue;
        }
        pending_blanks = 0;
        indent = line_indent;

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header
                .rfind(']')
                .map(|end| &header[..end])
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    parse_error(
                        line_num,
                        ParseErrorKind::InvalidSectionHeader(trimmed.to_string()),
                    )
                })?;
            last_key = None;
            if name == DEFAULT_SECTION {
                cursor = Some(Cursor::Defaults);
            } else if sections.iter().any(|section| section.name == name) {
                return Err(parse_error(
                    line_num,
                    ParseErrorKind::DuplicateSection(name.to_string()),
                ));
            } else {
                sections.push(Section::new(name));
                cursor = Some(Cursor::Section(sections.len() - 1));
            }
            continue;
        }

        let Some(cursor) = cursor else {
            return Err(parse_error(
                line_num,
                ParseErrorKind::MissingSectionHeader(trimmed.to_string()),
            ));
        };
        let (key, value) = parse_option(trimmed).map_err(|kind| parse_error(line_num, kind))?;
        let section = match cursor {
            Cursor::Defaults => &mut defaults,
            Cursor::Section(idx) => &mut sections[idx],
        };
        if section.contains_key(&key) {
            return Err(parse_error(
                line_num,
                ParseErrorKind::DuplicateOption {
                    section: section.name.clone(),
                    key,
                },
            ));
        }
        section.entries.push((key, value));
        last_key = Some(section.entries.len() - 1);
    }

    for section in &mut sections {
        for (key, value) in &defaults.entries {
            if !section.contains_key(key) {
                section.entries.push((key.clone(), value.clone()));
            }
        }
    }

    Ok(Ini { defaults, sections })
}

/// Split `key = value` or `key: value` at the first delimiter.
fn parse_option(line: &str) -> Result<(String, String), ParseErrorKind> {
    let (key, value) = line
        .split_once(['=', ':'])
        .ok_or_else(|| ParseErrorKind::MissingDelimiter(line.to_string()))?;
    let key = key.trim_end();
    if key.is_empty() {
        return Err(ParseErrorKind::EmptyKey(line.to_string()));
    }
    Ok((key.to_lowercase(), value.trim().to_string()))
}

fn parse_error(line: usize, kind: ParseErrorKind) -> ConfigError {
    ConfigError::Parse { line, kind }
}
