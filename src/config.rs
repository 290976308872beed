use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use crate::models::Target;

/// Monitored targets and the environment variable that overrides each URL.
const TARGET_DEFAULTS: &[(&str, &str, &str, &str)] = &[
    ("mainServer", "Main Server", "MAIN_SERVER_URL", "http://localhost:5000/ping"),
    ("apiServer", "API Server", "API_SERVER_URL", "http://localhost:5001/ping"),
];

fn default_api_port() -> u16 { 3000 }
fn default_ping_interval() -> u64 { 300 }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Start a new cycle on every tick, even if the previous one is still running.
    AllowOverlap,
    /// Skip the tick while the previous cycle is still in flight. Without a
    /// probe timeout one hung target keeps its cycle open, and every later
    /// tick is skipped for all targets.
    SkipIfRunning,
}

impl FromStr for OverlapPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" | "allow-overlap" => Ok(OverlapPolicy::AllowOverlap),
            "skip" | "skip-if-running" => Ok(OverlapPolicy::SkipIfRunning),
            other => bail!("unknown overlap policy '{}' (expected 'allow' or 'skip')", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub targets: TargetRegistry,
    pub api_port: u16,
    pub ping_interval: Duration,
    pub overlap_policy: OverlapPolicy,
    pub probe_timeout: Option<Duration>,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let targets = TARGET_DEFAULTS
            .iter()
            .map(|(id, name, env_key, default_url)| {
                let url = var(*env_key).unwrap_or_else(|| default_url.to_string());
                Target::new(*id, *name, url)
            })
            .collect();

        let api_port = parse_var(&var, "PORT")?.unwrap_or_else(default_api_port);

        let interval_secs = parse_var::<u64>(&var, "PING_INTERVAL_SECS")?.unwrap_or_else(default_ping_interval);
        if interval_secs == 0 {
            bail!("PING_INTERVAL_SECS must be greater than zero");
        }

        let overlap_policy = parse_var(&var, "OVERLAP_POLICY")?.unwrap_or(OverlapPolicy::AllowOverlap);
        let probe_timeout = parse_var::<u64>(&var, "PROBE_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            targets: TargetRegistry::new(targets)?,
            api_port,
            ping_interval: Duration::from_secs(interval_secs),
            overlap_policy,
            probe_timeout,
        })
    }

    /// Skipping overlapping cycles with no probe timeout lets a single hung
    /// target stall the whole schedule.
    pub fn can_stall_on_hung_target(&self) -> bool {
        self.overlap_policy == OverlapPolicy::SkipIfRunning && self.probe_timeout.is_none()
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}

/// Ordered, fixed set of targets with unique ids.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new(targets: Vec<Target>) -> Result<Self> {
        let mut seen = HashSet::new();
        for target in &targets {
            if !seen.insert(target.id.as_str()) {
                bail!("duplicate target id '{}'", target.id);
            }
            if target.url.trim().is_empty() {
                bail!("target '{}' has an empty URL", target.id);
            }
        }
        Ok(Self { targets })
    }

    pub fn all(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<MonitorConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.api_port, 3000);
        assert_eq!(config.ping_interval, Duration::from_secs(300));
        assert_eq!(config.overlap_policy, OverlapPolicy::AllowOverlap);
        assert_eq!(config.probe_timeout, None);

        let targets = config.targets.all();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, "mainServer");
        assert_eq!(targets[0].name, "Main Server");
        assert_eq!(targets[0].url, "http://localhost:5000/ping");
        assert_eq!(targets[1].id, "apiServer");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_with(&[
            ("MAIN_SERVER_URL", "https://main.example.com/ping"),
            ("PORT", "8080"),
            ("PING_INTERVAL_SECS", "60"),
            ("OVERLAP_POLICY", "skip"),
            ("PROBE_TIMEOUT_SECS", "10"),
        ])
        .unwrap();
        assert_eq!(config.targets.all()[0].url, "https://main.example.com/ping");
        assert_eq!(config.targets.all()[1].url, "http://localhost:5001/ping");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.ping_interval, Duration::from_secs(60));
        assert_eq!(config.overlap_policy, OverlapPolicy::SkipIfRunning);
        assert_eq!(config.probe_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_with(&[("MAIN_SERVER_URL", "  "), ("PORT", "")]).unwrap();
        assert_eq!(config.targets.all()[0].url, "http://localhost:5000/ping");
        assert_eq!(config.api_port, 3000);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config_with(&[("PORT", "http")]).unwrap_err();
        assert!(format!("{:#}", err).contains("PORT"));

        let err = config_with(&[("OVERLAP_POLICY", "sometimes")]).unwrap_err();
        assert!(format!("{:#}", err).contains("OVERLAP_POLICY"));

        assert!(config_with(&[("PING_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn skip_policy_without_timeout_can_stall() {
        assert!(config_with(&[("OVERLAP_POLICY", "skip")]).unwrap().can_stall_on_hung_target());
        assert!(!config_with(&[("OVERLAP_POLICY", "skip"), ("PROBE_TIMEOUT_SECS", "30")])
            .unwrap()
            .can_stall_on_hung_target());
        assert!(!config_with(&[]).unwrap().can_stall_on_hung_target());
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let err = TargetRegistry::new(vec![
            Target::new("a", "A", "http://a"),
            Target::new("a", "Also A", "http://b"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn registry_rejects_empty_urls() {
        assert!(TargetRegistry::new(vec![Target::new("a", "A", "")]).is_err());
    }
}
