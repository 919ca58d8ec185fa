//! XDG Base Directory Specification support.
//!
//! Implements path resolution following the XDG Base Directory spec: every `$XDG_*`
//! variable is read from an [`Env`], stripped of relative entries, and replaced by the
//! spec's default when missing or blank.
//!
//! See <https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html>.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config_files::ini::{ConfigError, parse_ini};
use crate::fs::{filter_abs_path, split_paths};
use crate::os::env::Env;

/// Default for `$XDG_CONFIG_DIRS`.
pub const DEFAULT_CONFIG_DIRS: &str = "/etc/xdg";
/// Default for `$XDG_DATA_DIRS`.
pub const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";
/// Name of the user directories file inside [`config_home`].
pub const USER_DIRS_FILE: &str = "user-dirs.dirs";

const USER_DIRS_SECTION: &str = "user_dirs";

/// Errors encountered when resolving XDG directories.
#[derive(Debug, Error)]
pub enum XdgError {
    /// Variable is unset and its default lives in the home directory, which is unknown.
    #[error("could not determine the home directory")]
    HomeNotFound,

    #[error("failed to read `{}`", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed user directories file `{}`", path.display())]
    UserDirs { path: PathBuf, source: ConfigError },
}

/// Path to the home directory of the current user.
///
/// `$HOME` if it is set and not blank, otherwise [`std::env::home_dir`].
pub fn user_home(env: &Env) -> Option<PathBuf> {
    env.getenv("HOME", None)
        .present()
        .map(PathBuf::from)
        .or_else(std::env::home_dir)
}

fn home_var(env: &Env, key: &str, fallback: &[&str]) -> Result<PathBuf, XdgError> {
    if let Some(value) = env.getenv_with(key, None, filter_abs_path).present() {
        return Ok(PathBuf::from(value));
    }
    let mut path = user_home(env).ok_or(XdgError::HomeNotFound)?;
    path.extend(fallback);
    debug!(key = %key, path = %path.display(), "using default XDG directory");
    Ok(path)
}

fn dirs_var(env: &Env, key: &str, fallback: &str) -> Vec<PathBuf> {
    env.getenv_with(key, Some(fallback), filter_abs_path)
        .present()
        .map_or_else(|| split_paths(fallback), |value| split_paths(&value))
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

/// Get proper path for `$XDG_CACHE_HOME`, defaulting to `~/.cache`.
///
/// # Errors
///
/// [`XdgError::HomeNotFound`] if the variable is unset and [`user_home`] returns [`None`].
pub fn cache_home(env: &Env) -> Result<PathBuf, XdgError> {
    home_var(env, "XDG_CACHE_HOME", &[".cache"])
}

/// Get proper paths for `$XDG_CONFIG_DIRS`, defaulting to [`DEFAULT_CONFIG_DIRS`].
pub fn config_dirs(env: &Env) -> Vec<PathBuf> {
    dirs_var(env, "XDG_CONFIG_DIRS", DEFAULT_CONFIG_DIRS)
}

/// Get proper path for `$XDG_CONFIG_HOME`, defaulting to `~/.config`.
///
/// # Errors
///
/// [`XdgError::HomeNotFound`] if the variable is unset and [`user_home`] returns [`None`].
pub fn config_home(env: &Env) -> Result<PathBuf, XdgError> {
    home_var(env, "XDG_CONFIG_HOME", &[".config"])
}

/// Get proper paths for `$XDG_DATA_DIRS`, defaulting to [`DEFAULT_DATA_DIRS`].
pub fn data_dirs(env: &Env) -> Vec<PathBuf> {
    dirs_var(env, "XDG_DATA_DIRS", DEFAULT_DATA_DIRS)
}

/// Get proper path for `$XDG_DATA_HOME`, defaulting to `~/.local/share`.
///
/// # Errors
///
/// [`XdgError::HomeNotFound`] if the variable is unset and [`user_home`] returns [`None`].
pub fn data_home(env: &Env) -> Result<PathBuf, XdgError> {
    home_var(env, "XDG_DATA_HOME", &[".local", "share"])
}

/// Get proper path for `$XDG_RUNTIME_DIR`.
///
/// # Returns
///
/// There is no default: [`None`] is returned if the variable is unset, blank or holds no
/// absolute path, and callers have to pick their own replacement.
pub fn runtime_dir(env: &Env) -> Option<PathBuf> {
    env.getenv_with("XDG_RUNTIME_DIR", None, filter_abs_path)
        .present()
        .map(PathBuf::from)
}

/// Get proper path for `$XDG_STATE_HOME`, defaulting to `~/.local/state`.
///
/// # Errors
///
/// [`XdgError::HomeNotFound`] if the variable is unset and [`user_home`] returns [`None`].
pub fn state_home(env: &Env) -> Result<PathBuf, XdgError> {
    home_var(env, "XDG_STATE_HOME", &[".local", "state"])
}

/// All base directories, as returned by [`base_dirs`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseDirs {
    pub cache_home: PathBuf,
    pub config_dirs: Vec<PathBuf>,
    pub config_home: PathBuf,
    pub data_dirs: Vec<PathBuf>,
    pub data_home: PathBuf,
    pub runtime_dir: Option<PathBuf>,
    pub state_home: PathBuf,
}

/// Resolve every base directory at once.
///
/// # Errors
///
/// [`XdgError::HomeNotFound`] if any `*_HOME` directory needs its default and there is no home
/// directory.
///
/// # Examples
///
/// ```rust,no_run
/// # use toolboks::config_files::xdg;
/// # use toolboks::os::env::Env;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dirs = xdg::base_dirs(&Env::new())?;
/// let socket_dir = dirs.runtime_dir.unwrap_or_else(std::env::temp_dir);
/// # Ok(())
/// # }
/// ```
pub fn base_dirs(env: &Env) -> Result<BaseDirs, XdgError> {
    Ok(BaseDirs {
        cache_home: cache_home(env)?,
        config_dirs: config_dirs(env),
        config_home: config_home(env)?,
        data_dirs: data_dirs(env),
        data_home: data_home(env)?,
        runtime_dir: runtime_dir(env),
        state_home: state_home(env)?,
    })
}

/// Well-known user directories, read from [`USER_DIRS_FILE`].
///
/// Keys are the lowercased variable names without their `XDG_` prefix, e.g. `desktop_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserDirs {
    dirs: BTreeMap<String, PathBuf>,
}

macro_rules! impl_user_dir_getters {
    (
        $(
            $key:literal = $name:ident
        ),*$(,)?
    ) => {
        $(
            #[doc = concat!("Value of `XDG_", $key, "`, if present.")]
            pub fn $name(&self) -> Option<&Path> {
                self.get(&$key.to_lowercase())
            }
        )*
    };
}

impl UserDirs {
    /// Get directory stored under `key`, e.g. `music_dir`.
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.dirs.get(key).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.dirs
            .iter()
            .map(|(key, path)| (key.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    impl_user_dir_getters!(
        "DESKTOP_DIR" = desktop,
        "DOWNLOAD_DIR" = download,
        "TEMPLATES_DIR" = templates,
        "PUBLICSHARE_DIR" = publicshare,
        "DOCUMENTS_DIR" = documents,
        "MUSIC_DIR" = music,
        "PICTURES_DIR" = pictures,
        "VIDEOS_DIR" = videos,
    );
}

/// Read user directories from `user-dirs.dirs` in [`config_home`].
///
/// # Returns
///
/// `Ok(None)` if the file doesn't exist.
///
/// # Errors
///
/// Errors of [`config_home`], [`XdgError::Io`] if the file can't be read, and
/// [`XdgError::UserDirs`] if its content is malformed.
pub fn user_dirs(env: &Env) -> Result<Option<UserDirs>, XdgError> {
    let path = config_home(env)?.join(USER_DIRS_FILE);
    if !path.is_file() {
        debug!(path = %path.display(), "no user directories file");
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|source| XdgError::Io {
        path: path.clone(),
        source,
    })?;
    // The file has no section header of its own.
    let ini = match parse_ini(&format!("[{USER_DIRS_SECTION}]\n{content}")) {
        Ok(ini) => ini,
        Err(source) => return Err(XdgError::UserDirs { path, source }),
    };
    let home = user_home(env).map(|home| home.to_string_lossy().into_owned());
    let dirs = ini
        .section(USER_DIRS_SECTION)
        .into_iter()
        .flat_map(|section| section.iter())
        .map(|(key, value)| {
            let key = key.strip_prefix("xdg_").unwrap_or(key).to_string();
            let value = expand_home(unquote(value), home.as_deref());
            (key, PathBuf::from(value))
        })
        .collect();
    Ok(Some(UserDirs { dirs }))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}

/// Replace `$HOME` and `${HOME}` in `value`, leaving any other variable untouched.
fn expand_home(value: &str, home: Option<&str>) -> String {
    shellexpand::env_with_context_no_errors(value, |var| match var {
        "HOME" => home,
        _ => None,
    })
    .into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use claim::{assert_err, assert_none, assert_ok, assert_some, assert_some_eq};
    use std::ffi::OsString;
    use tempfile::tempdir;

    const HOME: &str = "/home/toolboks";
    const FAKE_PATH: &str = "/tmp/toolboks/testdata/fakepath";

    const XDG_VARS: [&str; 7] = [
        "XDG_CACHE_HOME",
        "XDG_CONFIG_DIRS",
        "XDG_CONFIG_HOME",
        "XDG_DATA_DIRS",
        "XDG_DATA_HOME",
        "XDG_RUNTIME_DIR",
        "XDG_STATE_HOME",
    ];

    const USER_DIRS: &str = r#"# This file is written by xdg-user-dirs-update
# If you want to change or add directories, just edit the line you're
# interested in. All local changes will be retained on the next run.
XDG_DESKTOP_DIR="$HOME/Desktop"
XDG_DOWNLOAD_DIR="$HOME/Downloads"
XDG_TEMPLATES_DIR="$HOME/Templates"
XDG_PUBLICSHARE_DIR="$HOME/Public"
XDG_DOCUMENTS_DIR="$HOME/Documents"
XDG_MUSIC_DIR="$HOME/Music"
XDG_PICTURES_DIR="$HOME/Pictures"
XDG_VIDEOS_DIR="$HOME/Videos"
"#;

    fn home_env() -> Env {
        Env::from_iter([("HOME", HOME)])
    }

    fn env_with(pairs: &[(&str, &str)]) -> Env {
        Env::from_iter(
            pairs
                .iter()
                .chain([("HOME", HOME)].iter())
                .map(|(key, value)| (OsString::from(key), OsString::from(value))),
        )
    }

    #[test]
    fn base_dirs_from_env() {
        let pairs: Vec<_> = XDG_VARS.iter().map(|key| (*key, FAKE_PATH)).collect();
        let dirs = assert_ok!(base_dirs(&env_with(&pairs)));
        let fake = PathBuf::from(FAKE_PATH);
        assert_eq!(dirs.cache_home, fake);
        assert_eq!(dirs.config_dirs, vec![fake.clone()]);
        assert_eq!(dirs.config_home, fake);
        assert_eq!(dirs.data_dirs, vec![fake.clone()]);
        assert_eq!(dirs.data_home, fake);
        assert_some_eq!(dirs.runtime_dir, fake.clone());
        assert_eq!(dirs.state_home, fake);
    }

    #[test]
    fn base_dirs_default() {
        let dirs = assert_ok!(base_dirs(&home_env()));
        let home = PathBuf::from(HOME);
        assert_eq!(dirs.cache_home, home.join(".cache"));
        assert_eq!(dirs.config_dirs, vec![PathBuf::from("/etc/xdg")]);
        assert_eq!(dirs.config_home, home.join(".config"));
        assert_eq!(
            dirs.data_dirs,
            vec![
                PathBuf::from("/usr/local/share"),
                PathBuf::from("/usr/share")
            ]
        );
        assert_eq!(dirs.data_home, home.join(".local/share"));
        assert_none!(dirs.runtime_dir);
        assert_eq!(dirs.state_home, home.join(".local/state"));
    }

    #[test]
    fn blank_variables_use_defaults() {
        let pairs: Vec<_> = XDG_VARS.iter().map(|key| (*key, "")).collect();
        let dirs = assert_ok!(base_dirs(&env_with(&pairs)));
        assert_eq!(dirs, assert_ok!(base_dirs(&home_env())));
    }

    #[test]
    fn relative_paths_are_ignored() {
        let env = env_with(&[
            ("XDG_CACHE_HOME", "relative/cache"),
            ("XDG_CONFIG_DIRS", "relative:/opt/xdg:other"),
            ("XDG_DATA_DIRS", "a:b"),
            ("XDG_RUNTIME_DIR", "run/user"),
            ("XDG_STATE_HOME", "state:/var/state"),
        ]);
        assert_eq!(assert_ok!(cache_home(&env)), PathBuf::from(HOME).join(".cache"));
        assert_eq!(config_dirs(&env), vec![PathBuf::from("/opt/xdg")]);
        assert_eq!(
            data_dirs(&env),
            vec![
                PathBuf::from("/usr/local/share"),
                PathBuf::from("/usr/share")
            ]
        );
        assert_none!(runtime_dir(&env));
        assert_eq!(assert_ok!(state_home(&env)), PathBuf::from("/var/state"));
    }

    #[test]
    fn dirs_keep_order() {
        let env = env_with(&[("XDG_DATA_DIRS", "/b:/a:/c")]);
        assert_eq!(
            data_dirs(&env),
            vec![PathBuf::from("/b"), PathBuf::from("/a"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn runtime_dir_has_no_default() {
        assert_none!(runtime_dir(&home_env()));
        assert_none!(runtime_dir(&env_with(&[("XDG_RUNTIME_DIR", "")])));
        assert_some_eq!(
            runtime_dir(&env_with(&[("XDG_RUNTIME_DIR", "/run/user/1000")])),
            PathBuf::from("/run/user/1000")
        );
    }

    #[test]
    fn missing_home() {
        let env = Env::from_iter([("HOME", ""), ("XDG_CACHE_HOME", FAKE_PATH)]);
        // An explicit variable never needs the home directory.
        assert_eq!(assert_ok!(cache_home(&env)), PathBuf::from(FAKE_PATH));
        assert_eq!(config_dirs(&env), vec![PathBuf::from("/etc/xdg")]);
    }

    #[test]
    fn user_home_prefers_env() {
        assert_some_eq!(user_home(&home_env()), PathBuf::from(HOME));
        assert_eq!(user_home(&Env::from_iter([("HOME", "")])), std::env::home_dir());
    }

    #[test]
    fn user_dirs_from_file() {
        let tmp = tempdir().expect("needed for tests");
        std::fs::write(tmp.path().join(USER_DIRS_FILE), USER_DIRS).expect("needed for tests");
        let config = tmp.path().to_string_lossy().into_owned();
        let env = env_with(&[("XDG_CONFIG_HOME", config.as_str())]);

        let dirs = assert_some!(assert_ok!(user_dirs(&env)));
        let home = Path::new(HOME);
        assert_eq!(dirs.len(), 8);
        assert_some_eq!(dirs.desktop(), home.join("Desktop").as_path());
        assert_some_eq!(dirs.download(), home.join("Downloads").as_path());
        assert_some_eq!(dirs.templates(), home.join("Templates").as_path());
        assert_some_eq!(dirs.publicshare(), home.join("Public").as_path());
        assert_some_eq!(dirs.documents(), home.join("Documents").as_path());
        assert_some_eq!(dirs.music(), home.join("Music").as_path());
        assert_some_eq!(dirs.pictures(), home.join("Pictures").as_path());
        assert_some_eq!(dirs.videos(), home.join("Videos").as_path());
        assert_some_eq!(dirs.get("desktop_dir"), home.join("Desktop").as_path());
    }

    #[test]
    fn user_dirs_quotes_and_braces() {
        let tmp = tempdir().expect("needed for tests");
        std::fs::write(
            tmp.path().join(USER_DIRS_FILE),
            "XDG_MUSIC_DIR='${HOME}/Music'\nXDG_VIDEOS_DIR=/srv/videos\nXDG_CUSTOM_DIR=\"$HOMEDIR/x\"\n",
        )
        .expect("needed for tests");
        let config = tmp.path().to_string_lossy().into_owned();
        let dirs = assert_some!(assert_ok!(user_dirs(&env_with(&[(
            "XDG_CONFIG_HOME",
            config.as_str()
        )]))));
        assert_some_eq!(dirs.music(), Path::new("/home/toolboks/Music"));
        assert_some_eq!(dirs.videos(), Path::new("/srv/videos"));
        assert_some_eq!(dirs.get("custom_dir"), Path::new("$HOMEDIR/x"));
        assert_none!(dirs.desktop());
    }

    #[test]
    fn user_dirs_without_file() {
        let tmp = tempdir().expect("needed for tests");
        let missing = tmp.path().join("nonexisting-directory");
        let config = missing.to_string_lossy().into_owned();
        assert_none!(assert_ok!(user_dirs(&env_with(&[("XDG_CONFIG_HOME", config.as_str())]))));
    }

    #[test]
    fn malformed_user_dirs() {
        let tmp = tempdir().expect("needed for tests");
        std::fs::write(tmp.path().join(USER_DIRS_FILE), "not a key value line\n")
            .expect("needed for tests");
        let config = tmp.path().to_string_lossy().into_owned();
        let err = assert_err!(user_dirs(&env_with(&[("XDG_CONFIG_HOME", config.as_str())])));
        assert!(matches!(err, XdgError::UserDirs { .. }));
    }

    #[test]
    fn unquote_values() {
        assert_eq!(unquote("\"a\""), "a");
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("\"a'"), "\"a'");
        assert_eq!(unquote("a"), "a");
    }
}
