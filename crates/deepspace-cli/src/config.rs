//! Configuration Vault – reads/writes `~/.deepspace/config.toml`.

use deepspace_runtime::RobotConfig;
use deepspace_types::RobotState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Parameters of the simulated rig the CLI drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Encoder ticks the simulated leadscrew moves per cycle at full output.
    pub leadscrew_speed_ticks: f64,
    /// Home the leadscrew before the loop starts instead of in its homing
    /// phase.
    pub blocking_homing: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            leadscrew_speed_ticks: 400.0,
            blocking_homing: false,
        }
    }
}

/// Persisted user configuration stored in `~/.deepspace/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub robot: RobotConfig,
    pub sim: SimConfig,
}

/// Return the path to `~/.deepspace/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".deepspace").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.  Overrides are applied before the
/// robot section is validated.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    cfg.robot.validate().map_err(|e| e.to_string())?;
    Ok(Some(cfg))
}

/// Apply `DEEPSPACE_*` environment variable overrides to `cfg`.
///
/// Unparseable values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `DEEPSPACE_CONTROL_PERIOD_MS` | `robot.control_period_ms` |
/// | `DEEPSPACE_INITIAL_STATE` | `robot.initial_state` (e.g. `WAITING_TO_LOAD`) |
/// | `DEEPSPACE_LEADSCREW_LENGTH` | `robot.leadscrew.length_in` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`.  Extracted for testability without
/// mutating environment variables.
pub(crate) fn apply_overrides_from(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DEEPSPACE_CONTROL_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.robot.control_period_ms = ms;
    }
    if let Some(v) = lookup("DEEPSPACE_INITIAL_STATE")
        && let Ok(state) = v.parse::<RobotState>()
    {
        cfg.robot.initial_state = state;
    }
    if let Some(v) = lookup("DEEPSPACE_LEADSCREW_LENGTH")
        && let Ok(inches) = v.parse::<f64>()
    {
        cfg.robot.leadscrew.length_in = inches;
    }
}

/// Save the config to disk, creating `~/.deepspace/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner only (rwx------).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Owner-only read/write (rw-------).
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
