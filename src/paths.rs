//! Where cfprov looks for its manifest and state
//!
//! - Manifest: `cfprov.toml` in the config directory, which is
//!   `CFPROV_CONFIG_DIR`, else `$XDG_CONFIG_HOME/cfprov`, else
//!   `~/.config/cfprov` (`%APPDATA%\cfprov` on Windows).
//! - State: `state.toml` in the state directory, which is
//!   `CFPROV_STATE_DIR`, else `$XDG_STATE_HOME/cfprov`, else
//!   `~/.local/state/cfprov` (`%LOCALAPPDATA%\cfprov` on Windows).
//!
//! `--manifest` and `--state` bypass the lookup.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CFPROV_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "CFPROV_STATE_DIR";

/// Manifest file name inside the config directory
pub const MANIFEST_FILE: &str = "cfprov.toml";

/// State file name inside the state directory
pub const STATE_FILE: &str = "state.toml";

const APP_DIR: &str = "cfprov";

/// Directory holding the default manifest
pub fn config_dir() -> Result<PathBuf> {
    resolve_dir(ENV_CONFIG_DIR, "XDG_CONFIG_HOME", || {
        platform_base(dirs::config_dir, &[".config"])
    })
}

/// Directory holding the default state file
pub fn state_dir() -> Result<PathBuf> {
    resolve_dir(ENV_STATE_DIR, "XDG_STATE_HOME", || {
        platform_base(dirs::data_local_dir, &[".local", "state"])
    })
}

fn resolve_dir(
    override_var: &str,
    xdg_var: &str,
    base: impl FnOnce() -> Result<PathBuf>,
) -> Result<PathBuf> {
    let path = if let Ok(dir) = std::env::var(override_var) {
        expand(&dir)
    } else if let Ok(xdg) = std::env::var(xdg_var) {
        PathBuf::from(xdg).join(APP_DIR)
    } else {
        base()?.join(APP_DIR)
    };
    log::debug!("Using directory {}", path.display());
    Ok(path)
}

/// Windows uses the known folder; everything else a dot-directory in home
fn platform_base(windows: fn() -> Option<PathBuf>, unix: &[&str]) -> Result<PathBuf> {
    if cfg!(windows)
        && let Some(dir) = windows()
    {
        return Ok(dir);
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(unix.iter().fold(home, |path, part| path.join(part)))
}

/// Manifest path: the explicit one (expanded) or the default
pub fn manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(config_dir()?.join(MANIFEST_FILE)),
    }
}

/// State path: the explicit one (expanded) or the default
pub fn state_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(state_dir()?.join(STATE_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, PoisonError};

    /// Held by every test that changes the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Run `f` with each variable set (`Some`) or removed (`None`), then
    /// restore the previous values
    fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved: Vec<(&str, Option<String>)> =
            vars.iter().map(|(key, _)| (*key, env::var(key).ok())).collect();
        for (key, value) in vars {
            set_env(key, *value);
        }
        let result = f();
        for (key, value) in saved {
            set_env(key, value.as_deref());
        }
        result
    }

    fn set_env(key: &str, value: Option<&str>) {
        // SAFETY: callers hold ENV_LOCK, so no other test touches the environment
        unsafe {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env(&[(ENV_CONFIG_DIR, Some("/custom/config/path"))], || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config/path"));
            assert_eq!(
                manifest_path(None).unwrap(),
                PathBuf::from("/custom/config/path/cfprov.toml")
            );
        });
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        let expected = home.join("dotfiles").join("cfprov-tilde-test");
        with_env(
            &[(ENV_CONFIG_DIR, Some("~/dotfiles/cfprov-tilde-test"))],
            || assert_eq!(config_dir().unwrap(), expected),
        );
    }

    #[test]
    fn test_state_dir_env_override() {
        with_env(&[(ENV_STATE_DIR, Some("/custom/state"))], || {
            assert_eq!(state_dir().unwrap(), PathBuf::from("/custom/state"));
            assert_eq!(
                state_path(None).unwrap(),
                PathBuf::from("/custom/state/state.toml")
            );
        });
    }

    #[test]
    fn test_xdg_state_home() {
        with_env(
            &[
                (ENV_STATE_DIR, None),
                ("XDG_STATE_HOME", Some("/tmp/xdg-state-test")),
            ],
            || {
                assert_eq!(
                    state_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-state-test/cfprov")
                );
            },
        );
    }

    #[test]
    #[cfg(not(windows))]
    fn test_platform_default_state_dir() {
        let home = dirs::home_dir().unwrap();
        with_env(&[(ENV_STATE_DIR, None), ("XDG_STATE_HOME", None)], || {
            assert_eq!(
                state_dir().unwrap(),
                home.join(".local").join("state").join("cfprov")
            );
        });
    }

    #[test]
    fn test_explicit_paths_win() {
        with_env(&[(ENV_STATE_DIR, Some("/ignored"))], || {
            let manifest = manifest_path(Some(Path::new("/srv/cf/main.toml"))).unwrap();
            assert_eq!(manifest, PathBuf::from("/srv/cf/main.toml"));

            let state = state_path(Some(Path::new("/srv/cf/state.toml"))).unwrap();
            assert_eq!(state, PathBuf::from("/srv/cf/state.toml"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
