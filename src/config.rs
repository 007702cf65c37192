/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub controls: ControlsConfig,
    pub levels_dir: PathBuf,
    /// `None` disables logging.
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

/// Key names as written in the file ("Up", "w", "Enter", ...).
/// `ui::input::KeyBindings` turns these into key codes.
#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub reset: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    controls: TomlControls,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_up")]
    up: Vec<String>,
    #[serde(default = "default_down")]
    down: Vec<String>,
    #[serde(default = "default_left")]
    left: Vec<String>,
    #[serde(default = "default_right")]
    right: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 60 }

fn default_up() -> Vec<String> { vec!["Up".into(), "w".into()] }
fn default_down() -> Vec<String> { vec!["Down".into(), "s".into()] }
fn default_left() -> Vec<String> { vec!["Left".into(), "a".into()] }
fn default_right() -> Vec<String> { vec!["Right".into(), "d".into()] }
fn default_reset() -> Vec<String> { vec!["r".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
            reset: default_reset(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: String::new(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let log_file = match toml_cfg.general.log_file.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        GameConfig {
            speed: SpeedConfig {
                // zero would spin the loop
                tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
            },
            controls: ControlsConfig {
                up: toml_cfg.controls.up,
                down: toml_cfg.controls.down,
                left: toml_cfg.controls.left,
                right: toml_cfg.controls.right,
                reset: toml_cfg.controls.reset,
            },
            levels_dir,
            log_file,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

/// Candidate directories to search: exe dir + CWD + user data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // ~/.local/share/slidebox
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/slidebox");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before the terminal is taken over, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: {} parse error: {e}", path.display());
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        let cfg: TomlConfig = toml::from_str(text).expect("valid toml");
        GameConfig::from_toml(cfg, &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.speed.tick_rate_ms, 60);
        assert_eq!(cfg.controls.up, vec!["Up".to_string(), "w".to_string()]);
        assert_eq!(cfg.controls.reset, vec!["r".to_string()]);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse(
            "[speed]\ntick_rate_ms = 120\n\n[controls]\nreset = [\"Backspace\"]\n\n[general]\nlog_file = \"slidebox.log\"\n",
        );
        assert_eq!(cfg.speed.tick_rate_ms, 120);
        assert_eq!(cfg.controls.reset, vec!["Backspace".to_string()]);
        assert_eq!(cfg.controls.left, vec!["Left".to_string(), "a".to_string()]);
        assert_eq!(cfg.log_file, Some(PathBuf::from("slidebox.log")));
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        assert_eq!(parse("[speed]\ntick_rate_ms = 0\n").speed.tick_rate_ms, 1);
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(toml::from_str::<TomlConfig>("[speed]\ntick_rate_ms = \"fast\"\n").is_err());
    }
}
