// Windows: roaming config under %APPDATA%, local data under %LOCALAPPDATA%.

use std::env;
use std::path::PathBuf;

fn env_dir(var: &str) -> PathBuf {
    env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"))
        .join("LaterList")
}

pub fn get_config_dir() -> PathBuf {
    env_dir("APPDATA")
}

pub fn get_data_dir() -> PathBuf {
    env_dir("LOCALAPPDATA")
}
