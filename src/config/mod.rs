use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(config_path: &Path) -> Self {
        Self::load_with_env(config_path, env::vars())
    }

    /// Defaults, then the rc file, then `vars` on top.
    pub fn load_with_env(config_path: &Path, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut map = default_map();

        // Read .runpadrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in vars {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map }
    }

    /// Environment values were folded in at load time, so `set` always wins.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    /// Override a value for this process only (CLI flags).
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Base URL of the execution service. `VITE_API_URL` is honoured as an alias
    /// so existing front-end env files keep working.
    pub fn api_url(&self) -> String {
        ["API_URL", "VITE_API_URL"]
            .iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.get_u64("REQUEST_TIMEOUT").unwrap_or(30)
    }

    pub fn default_language(&self) -> String {
        self.get("DEFAULT_LANGUAGE").unwrap_or_else(|| "python".to_string())
    }

    pub fn log_file(&self) -> PathBuf {
        self.get("RUNPAD_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("runpad").join("runpad.log"))
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "API_URL",
        "VITE_API_URL",
        "REQUEST_TIMEOUT",
        "DEFAULT_LANGUAGE",
    ];

    KEYS.contains(&k) || k.starts_with("RUNPAD_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("runpad").join(".runpadrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("REQUEST_TIMEOUT".into(), "30".into());
    m.insert("DEFAULT_LANGUAGE".into(), "python".into());
    m.insert("RUNPAD_LOG".into(), "warn".into());

    m
}
