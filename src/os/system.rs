//! Information about the current process and the host it runs on.

use std::path::PathBuf;

use tracing::debug;

use crate::config_files::xdg::user_home;
use crate::os::env::Env;

/// Name of the toolchain this crate was built with.
pub const IMPLEMENTATION: &str = "rustc";

/// Version of [`IMPLEMENTATION`], captured at build time.
pub const VERSION: &str = env!("TOOLBOKS_RUSTC_VERSION");

/// Snapshot of runtime and system facts, see [`SystemContext::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemContext {
    /// Network name of the host.
    pub hostname: String,
    /// Machine architecture, e.g. `x86_64`.
    pub machine: String,
    /// Target operating system identifier, e.g. `linux`.
    pub os: String,
    /// Human readable platform, `<system>-<release>-<machine>`.
    pub platform: String,
    /// Path to the running executable, if it could be determined.
    pub executable: Option<PathBuf>,
    /// [`SystemContext::executable`] with symlinks resolved.
    pub executable_real: Option<PathBuf>,
    pub implementation: String,
    pub version: String,
    /// Kernel or system name, e.g. `Linux`.
    pub system: String,
    /// Number of CPUs available to this process.
    pub cpu_count: Option<usize>,
    /// `$SHELL`.
    pub shell: Option<String>,
    /// `$USER`.
    pub user: Option<String>,
    pub user_home: Option<PathBuf>,
    /// `$VIRTUAL_ENV`.
    pub virtual_environment: Option<String>,
}

impl SystemContext {
    /// Read the current state of the host, using `env` for environmental variables.
    ///
    /// Never fails: facts which can't be determined are [`None`] or empty.
    pub fn probe(env: &Env) -> Self {
        let uname = Uname::current();
        let executable = std::env::current_exe().ok();
        let executable_real = executable.as_deref().map(resolve);
        let context = Self {
            hostname: uname.nodename.unwrap_or_else(|| hostname_fallback(env)),
            platform: format!("{}-{}-{}", uname.sysname, uname.release, uname.machine),
            machine: uname.machine,
            os: std::env::consts::OS.to_string(),
            executable,
            executable_real,
            implementation: IMPLEMENTATION.to_string(),
            version: VERSION.to_string(),
            system: uname.sysname,
            cpu_count: std::thread::available_parallelism()
                .map(|count| count.get())
                .ok(),
            shell: env.get("SHELL").ok().map(str::to_string),
            user: env.get("USER").ok().map(str::to_string),
            user_home: user_home(env),
            virtual_environment: env.get("VIRTUAL_ENV").ok().map(str::to_string),
        };
        debug!(?context, "probed system context");
        context
    }
}

/// [`SystemContext::probe`] over a fresh snapshot of the process environment.
pub fn context() -> SystemContext {
    SystemContext::probe(&Env::new())
}

#[cfg(feature = "full-resolve")]
fn resolve(path: &std::path::Path) -> PathBuf {
    soft_canonicalize::soft_canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(not(feature = "full-resolve"))]
fn resolve(path: &std::path::Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn hostname_fallback(env: &Env) -> String {
    env.get("COMPUTERNAME")
        .or_else(|_| env.get("HOSTNAME"))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Fields of `uname(2)`, or their compile-time approximations off unix.
#[derive(Debug, Clone)]
struct Uname {
    sysname: String,
    nodename: Option<String>,
    release: String,
    machine: String,
}

impl Uname {
    #[cfg(unix)]
    fn current() -> Self {
        use std::ffi::CStr;

        fn field(raw: &[libc::c_char]) -> String {
            // SAFETY: `uname` fills every field with a NUL-terminated string, and `utsname` was
            // zeroed before the call, so a terminator exists even if `uname` failed.
            unsafe { CStr::from_ptr(raw.as_ptr()) }
                .to_string_lossy()
                .into_owned()
        }

        // SAFETY: `utsname` consists of plain `c_char` arrays, for which all zeroes is valid.
        let mut name: libc::utsname = unsafe { std::mem::zeroed() };
        // SAFETY: `name` is a valid, writable `utsname`.
        if unsafe { libc::uname(&mut name) } != 0 {
            debug!("uname failed, using compile-time platform information");
            return Self::fallback();
        }
        let nodename = field(&name.nodename);
        Self {
            sysname: field(&name.sysname),
            nodename: (!nodename.is_empty()).then_some(nodename),
            release: field(&name.release),
            machine: field(&name.machine),
        }
    }

    #[cfg(not(unix))]
    fn current() -> Self {
        Self::fallback()
    }

    fn fallback() -> Self {
        let sysname = match std::env::consts::OS {
            "windows" => "Windows".to_string(),
            "macos" => "Darwin".to_string(),
            "linux" => "Linux".to_string(),
            other => other.to_string(),
        };
        Self {
            sysname,
            nodename: None,
            release: String::new(),
            machine: std::env::consts::ARCH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_none, assert_some, assert_some_eq};

    fn env() -> Env {
        Env::from_iter([
            ("HOME", "/home/toolboks"),
            ("SHELL", "/bin/zsh"),
            ("USER", "toolboks"),
            ("VIRTUAL_ENV", "/home/toolboks/.venv"),
        ])
    }

    #[test]
    fn environment_fields() {
        let context = SystemContext::probe(&env());
        assert_some_eq!(context.shell.as_deref(), "/bin/zsh");
        assert_some_eq!(context.user.as_deref(), "toolboks");
        assert_some_eq!(
            context.virtual_environment.as_deref(),
            "/home/toolboks/.venv"
        );
        assert_some_eq!(context.user_home, PathBuf::from("/home/toolboks"));
    }

    #[test]
    fn missing_environment_fields() {
        let context = SystemContext::probe(&Env::from_iter([("HOME", "/home/toolboks")]));
        assert_none!(context.shell);
        assert_none!(context.user);
        assert_none!(context.virtual_environment);
    }

    #[test]
    fn host_fields() {
        let context = SystemContext::probe(&env());
        assert_eq!(context.os, std::env::consts::OS);
        assert_eq!(context.implementation, IMPLEMENTATION);
        assert!(!context.version.is_empty());
        assert!(!context.machine.is_empty());
        assert!(!context.system.is_empty());
        assert!(context.platform.starts_with(&context.system));
        assert!(context.platform.ends_with(&context.machine));
        assert_eq!(
            context.cpu_count,
            std::thread::available_parallelism().map(|n| n.get()).ok()
        );
    }

    #[test]
    fn executable_is_resolved() {
        let context = SystemContext::probe(&env());
        let executable = assert_some!(context.executable);
        let real = assert_some!(context.executable_real);
        assert!(executable.is_absolute());
        assert!(real.is_absolute());
        assert_eq!(real, std::fs::canonicalize(&executable).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_uname() {
        let context = SystemContext::probe(&env());
        assert_eq!(context.system, "Linux");
        assert_eq!(context.platform.split('-').next(), Some("Linux"));
    }

    #[test]
    fn probes_live_environment() {
        let context = context();
        assert_eq!(context.shell, std::env::var("SHELL").ok());
        assert_eq!(context.user, std::env::var("USER").ok());
    }
}
