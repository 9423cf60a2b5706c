//! Immutable startup configuration parsed from command-line flags.
//!
//! Built once in `main` and shared by reference afterwards; nothing mutates it
//! at runtime. Malformed entries in list-valued flags are dropped rather than
//! rejecting startup.

use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allowlist {
    All,
    Hosts(Vec<String>),
}

impl Allowlist {
    /// Exact string match against the peer IP, rendered without port.
    pub fn permits(&self, ip: &str) -> bool {
        match self {
            Allowlist::All => true,
            Allowlist::Hosts(hosts) => hosts.iter().any(|h| h == ip),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub logs: Vec<LogTarget>,
    /// Enabled metric names, in configured order. Kept as strings so that
    /// unknown names are ignored at sample time instead of failing here.
    pub metrics: Vec<String>,
    pub allowlist: Allowlist,
}

impl Config {
    /// Accepts `--flag value`, `--flag=value`, and `-p`; unknown flags are
    /// ignored so an older agent tolerates newer wrappers.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut it = args.into_iter();
        let _ = it.next(); // program name

        let mut port: Option<String> = None;
        let mut logs = String::new();
        let mut metrics = String::new();
        let mut hosts = "*".to_string();

        while let Some(a) = it.next() {
            match a.as_str() {
                "--port" | "-p" => port = it.next(),
                "--logs" => logs = it.next().unwrap_or_default(),
                "--system-metrics" => metrics = it.next().unwrap_or_default(),
                "--allowed-hosts" => hosts = it.next().unwrap_or_default(),
                _ => {
                    if let Some((flag, v)) = a.split_once('=') {
                        match flag {
                            "--port" => port = Some(v.to_string()),
                            "--logs" => logs = v.to_string(),
                            "--system-metrics" => metrics = v.to_string(),
                            "--allowed-hosts" => hosts = v.to_string(),
                            _ => {}
                        }
                    }
                }
            }
        }

        Config {
            port: port
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            logs: parse_log_targets(&logs),
            metrics: parse_list(&metrics),
            allowlist: parse_allowlist(&hosts),
        }
    }
}

/// `name:path,name:path`; items without a `:` are dropped. The path may itself
/// contain `:`, only the first one separates.
fn parse_log_targets(s: &str) -> Vec<LogTarget> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',')
        .filter_map(|item| match item.split_once(':') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => Some(LogTarget {
                name: name.to_string(),
                path: path.to_string(),
            }),
            _ => {
                warn!("ignoring malformed log mapping {item:?}");
                None
            }
        })
        .collect()
}

fn parse_list(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(str::to_string).collect()
}

fn parse_allowlist(s: &str) -> Allowlist {
    if s == "*" || s.is_empty() {
        Allowlist::All
    } else {
        Allowlist::Hosts(s.split(',').map(str::to_string).collect())
    }
}
