pub mod background_cache;
pub mod config;
pub mod controller;
pub mod defense;
pub mod field;
pub mod input;
pub mod leaderboard;
pub mod offense;
pub mod overlay;
pub mod phase;
pub mod play;
pub mod playtest;
pub mod proxy;
pub mod scoring;
pub mod session;

use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "DARKSIDE_DATA_DIR";

/// Where persisted session and cache files live: `DARKSIDE_DATA_DIR`, else
/// `$XDG_DATA_HOME/darkside`, else `$HOME/.local/share/darkside`.
pub fn resolve_data_dir<F>(mut get_env: F) -> Option<PathBuf>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut read = |key: &str| get_env(key).filter(|v| !v.trim().is_empty());
    if let Some(dir) = read(DATA_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = read("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg).join("darkside"));
    }
    read("HOME").map(|home| PathBuf::from(home).join(".local/share/darkside"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn data_dir_prefers_explicit_override() {
        let dir = resolve_data_dir(|k| match k {
            DATA_DIR_ENV => Some("/tmp/ds".to_string()),
            "HOME" => Some("/home/p".to_string()),
            _ => None,
        });
        assert_eq!(dir.as_deref(), Some(Path::new("/tmp/ds")));
    }

    #[test]
    fn data_dir_falls_back_to_xdg_then_home() {
        let xdg = resolve_data_dir(|k| match k {
            "XDG_DATA_HOME" => Some("/x".to_string()),
            "HOME" => Some("/home/p".to_string()),
            _ => None,
        });
        assert_eq!(xdg.as_deref(), Some(Path::new("/x/darkside")));

        let home = resolve_data_dir(|k| (k == "HOME").then(|| "/home/p".to_string()));
        assert_eq!(home.as_deref(), Some(Path::new("/home/p/.local/share/darkside")));
        assert_eq!(resolve_data_dir(|_| None), None);
    }
}
