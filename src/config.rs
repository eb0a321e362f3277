//!
//! config
//! ------
//! Runtime settings shared by both binaries. Precedence: command-line flag,
//! then environment variable, then built-in default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_STATE_DIR: &str = ".schooladmin";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 150;
pub const DEFAULT_MOCK_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    /// Directory holding the durable client storage document.
    pub state_dir: PathBuf,
    pub search_debounce: Duration,
    pub notice_secs: i64,
    pub mock_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            notice_secs: crate::routing::DEFAULT_NOTICE_SECS,
            mock_port: DEFAULT_MOCK_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_url: env::var("SCHOOLADMIN_API_URL").ok().filter(|s| !s.trim().is_empty()).unwrap_or(d.api_url),
            state_dir: env::var("SCHOOLADMIN_STATE_DIR").ok().map(PathBuf::from).unwrap_or(d.state_dir),
            search_debounce: parse_num_env::<u64>("SCHOOLADMIN_SEARCH_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.search_debounce),
            notice_secs: parse_num_env::<i64>("SCHOOLADMIN_NOTICE_SECS").filter(|s| *s > 0).unwrap_or(d.notice_secs),
            mock_port: parse_num_env::<u16>("SCHOOLADMIN_MOCK_PORT").unwrap_or(d.mock_port),
        }
    }

    /// Environment first, then any recognised flags in `args` on top.
    pub fn from_env_and_args(args: &[String]) -> Self {
        let mut cfg = Self::from_env();
        if let Some(p) = parse_port_arg(args, "--port") {
            cfg.mock_port = p;
        }
        if let Some(api) = arg_value(args, "--api") {
            cfg.api_url = api;
        }
        if let Some(dir) = arg_value(args, "--state-dir") {
            cfg.state_dir = PathBuf::from(dir);
        }
        cfg
    }

    pub fn notice_delay(&self) -> chrono::Duration { chrono::Duration::seconds(self.notice_secs) }
}

fn parse_num_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(val) => val.trim().parse::<T>().ok(),
        Err(_) => None,
    }
}

pub fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    arg_value(args, flag).and_then(|v| v.parse::<u16>().ok())
}

/// Value following `flag`, if both are present.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool { args.iter().any(|a| a == flag) }

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn flags_are_read_by_name() {
        let a = args(&["bin", "--port", "4000", "--api", "http://x:1", "--verbose"]);
        assert_eq!(parse_port_arg(&a, "--port"), Some(4000));
        assert_eq!(arg_value(&a, "--api").as_deref(), Some("http://x:1"));
        assert_eq!(arg_value(&a, "--verbose"), None);
        assert!(has_flag(&a, "--verbose"));
        assert_eq!(parse_port_arg(&args(&["--port", "abc"]), "--port"), None);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = AppConfig::from_env_and_args(&args(&["bin", "--port", "3999", "--state-dir", "/tmp/sa"]));
        assert_eq!(cfg.mock_port, 3999);
        assert_eq!(cfg.state_dir, PathBuf::from("/tmp/sa"));
        assert_eq!(AppConfig::default().search_debounce, Duration::from_millis(150));
        assert_eq!(AppConfig::default().notice_delay(), chrono::Duration::seconds(5));
    }
}
