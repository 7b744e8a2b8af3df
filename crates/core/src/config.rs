use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64_opt(profile: &str, key: &str) -> Option<u64> {
    profiled_env_opt(profile, key).and_then(|v| v.trim().parse().ok())
}

// ── Top-level config ──────────────────────────────────────────

/// Everything the relay needs, assembled once at start-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub poll: PollConfig,
    pub server: ServerConfig,
}

impl RelayConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RELAY_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RELAY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            source: SourceConfig::from_env_profiled(p),
            destination: DestinationConfig::from_env_profiled(p),
            poll: PollConfig::from_env_profiled(p),
            server: ServerConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  source:      base_url={}, timeframe={}, location={}, max_count={}",
            self.source.base_url,
            self.source.timeframe,
            self.source.location,
            self.source.max_detection_count
        );
        tracing::info!(
            "  destination: host={}, detection_limit={}, api_key={}",
            self.destination.hostname,
            self.destination.detection_limit,
            if self.destination.has_api_key() { "configured" } else { "(missing)" }
        );
        tracing::info!(
            "  poll:        every {}m, http_timeout={}",
            self.poll.interval_minutes,
            self.poll
                .http_timeout_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "(none)".to_string())
        );
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "source": {
                "base_url": self.source.base_url,
                "timeframe": self.source.timeframe,
                "location": self.source.location,
                "max_detection_count": self.source.max_detection_count,
            },
            "destination": {
                "hostname": self.destination.hostname,
                "detection_limit": self.destination.detection_limit,
                "api_key_configured": self.destination.has_api_key(),
            },
            "poll": {
                "interval_minutes": self.poll.interval_minutes,
                "http_timeout_secs": self.poll.http_timeout_secs,
            },
        })
    }
}

// ── Source (OrcaHello) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub max_detection_count: u32,
    /// Time window understood by the source API, e.g. `1w`, `24h`.
    pub timeframe: String,
    pub location: String,
}

impl SourceConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(
                p,
                "ORCAHELLO_BASE_URL",
                "https://aifororcasdetections.azurewebsites.net",
            )
            .trim_end_matches('/')
            .to_string(),
            max_detection_count: profiled_env_u32(p, "ORCAHELLO_MAX_DETECTION_COUNT", 1000),
            timeframe: profiled_env_or(p, "ORCAHELLO_TIMEFRAME", "1w"),
            location: profiled_env_or(p, "ORCAHELLO_LOCATION", "all"),
        }
    }
}

// ── Destination (Orcasite) ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub hostname: String,
    /// How many of the newest destination detections to compare against.
    pub detection_limit: u32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl DestinationConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            hostname: profiled_env_or(p, "ORCASITE_HOSTNAME", "beta.orcasound.net"),
            detection_limit: profiled_env_u32(p, "ORCASITE_DETECTION_LIMIT", 1).max(1),
            api_key: profiled_env_opt(p, "APIKEY"),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

// ── Poll loop ─────────────────────────────────────────────────

pub const DEFAULT_POLL_MINUTES: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_minutes: u64,
    /// Per-request timeout; `None` leaves the HTTP client's default (no timeout).
    pub http_timeout_secs: Option<u64>,
}

impl PollConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval_minutes: profiled_env_u64_opt(p, "POLL_FREQUENCY_IN_MINUTES")
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_POLL_MINUTES),
            http_timeout_secs: profiled_env_u64_opt(p, "HTTP_TIMEOUT_SECS").filter(|s| *s > 0),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

// ── Liveness server ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "RELAY_HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "RELAY_PORT", 8080),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
