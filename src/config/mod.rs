pub mod engine;

use std::path::PathBuf;

pub use engine::{load_config, try_load_config, ConfigError, EngineConfig};

const APP_DIR: &str = "com.letterloop.games";

/// Platform-specific app data directory, or the working directory as a fallback.
pub fn app_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support");
            dir.push(APP_DIR);
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push(APP_DIR);
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share");
            dir.push(APP_DIR);
            return dir;
        }
    }

    PathBuf::from(".")
}

pub fn default_config_path() -> PathBuf {
    app_data_dir().join("engine.toml")
}

pub fn default_profiles_path() -> PathBuf {
    app_data_dir().join("data").join("profiles.json")
}
