/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/mazerunner`. Missing file or missing keys fall back to
/// defaults; out-of-range numbers are clamped rather than rejected.

use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".local/share/mazerunner";

/// Smallest endless maze worth playing (one corridor bend).
const MIN_ENDLESS_SIZE: usize = 5;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    pub save_dir: PathBuf,
    pub log_level: LevelFilter,
    pub frame_rate: u32,
    pub max_level: u32,
    pub endless_start_size: usize,
    pub endless_max_size: usize,
    pub trail_length: usize,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub particles: bool,
    pub glow: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub hint: Vec<String>,
    pub retry: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_save_dir")]
    save_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_frame_rate")]
    frame_rate: u32,
    #[serde(default = "default_max_level")]
    max_level: u32,
    #[serde(default = "default_endless_start")]
    endless_start_size: usize,
    #[serde(default = "default_endless_max")]
    endless_max_size: usize,
    #[serde(default = "default_trail_length")]
    trail_length: usize,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_true")]
    particles: bool,
    #[serde(default = "default_true")]
    glow: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_hint")]
    hint: Vec<String>,
    #[serde(default = "default_retry")]
    retry: Vec<String>,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_save_dir() -> String { "save".into() }
fn default_log_level() -> String { "info".into() }

fn default_frame_rate() -> u32 { 60 }
fn default_max_level() -> u32 { 20 }
fn default_endless_start() -> usize { 5 }
fn default_endless_max() -> usize { 21 }
fn default_trail_length() -> usize { 12 }

fn default_true() -> bool { true }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_hint() -> Vec<String> { vec!["Y".into()] }
fn default_retry() -> Vec<String> { vec!["X".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            save_dir: default_save_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            frame_rate: default_frame_rate(),
            max_level: default_max_level(),
            endless_start_size: default_endless_start(),
            endless_max_size: default_endless_max(),
            trail_length: default_trail_length(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { particles: true, glow: true }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            hint: default_hint(),
            retry: default_retry(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    /// Built-in defaults with directories taken as given (relative to CWD).
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) CWD, (3) XDG data home.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs);
        cfg.save_dir = resolve_save_dir(&cfg.save_dir);
        cfg
    }

    /// Parse config text directly (no file search, no directory resolution).
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(t: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let log_level = t.general.log_level.parse::<LevelFilter>().unwrap_or_else(|_| {
            eprintln!("Warning: unknown log_level {:?}, using info", t.general.log_level);
            LevelFilter::Info
        });

        let endless_start_size = t.game.endless_start_size.max(MIN_ENDLESS_SIZE);
        let endless_max_size = t.game.endless_max_size.max(endless_start_size);

        GameConfig {
            levels_dir: resolve_levels_dir(&t.general.levels_dir, search_dirs),
            save_dir: PathBuf::from(&t.general.save_dir),
            log_level,
            frame_rate: t.game.frame_rate.clamp(1, 240),
            max_level: t.game.max_level.max(1),
            endless_start_size,
            endless_max_size,
            trail_length: t.game.trail_length,
            display: DisplayConfig {
                particles: t.display.particles,
                glow: t.display.glow,
            },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                hint: t.gamepad.hint,
                retry: t.gamepad.retry,
            },
        }
    }
}

/// Absolute paths are used as-is; relative ones are looked up in the
/// candidate dirs and fall back to CWD-relative.
fn resolve_levels_dir(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Relative save dirs hang off the first writable data home.
fn resolve_save_dir(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    data_home().join(dir)
}

/// Writable base directory: exe dir for portable installs, then XDG, then CWD.
fn data_home() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // system installs like /usr/games/ won't be writable
            let test_path = parent.join(".write_test_mazerunner");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Candidate directories to search: exe dir + CWD + XDG (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds data next to the real one.
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

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
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
///
/// Runs before the terminal is switched to raw mode, so warnings go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
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
