//! Agent settings read from the environment.
//!
//! Every setting has a default that targets a service on
//! `localhost:5000`. Malformed or out-of-range values fail at startup
//! instead of being silently replaced.

use std::str::FromStr;
use std::time::Duration;

use vigil_core::alert::MAX_ALERTS;
use vigil_core::error::CoreError;
use vigil_core::frame::{Resolution, DEFAULT_HEIGHT, DEFAULT_WIDTH};

use crate::sampler::DEFAULT_JPEG_QUALITY;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_REFRESH_RATE_HZ: u32 = 60;
const DEFAULT_ANALYSIS_INTERVAL_MS: u64 = 500;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_REFRESH_RATE_HZ: u32 = 240;
const MILLISECONDS: &str = "a positive number of milliseconds";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected} (got '{value}')")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid capture resolution: {0}")]
    Resolution(#[from] CoreError),
}

/// Agent configuration loaded from environment variables.
///
/// Every field has a default suitable for a local analysis service.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the analysis service (default: `http://localhost:5000`).
    pub api_url: String,
    /// Resolution requested from the camera (default: `640x480`).
    pub capture_resolution: Resolution,
    /// Render loop frequency (default: `60`).
    pub refresh_rate_hz: u32,
    /// Period of the analysis sampler (default: 500 ms).
    pub analysis_interval: Duration,
    /// Period of the alert feed and status poller (default: 3000 ms).
    pub poll_interval: Duration,
    /// Alerts requested per poll, clamped to `1..=20` (default: `20`).
    pub alert_limit: usize,
    /// Pixelate the face region of outbound snapshots (default: `true`).
    pub mask_outbound_frames: bool,
    /// JPEG quality of outbound snapshots, `1..=100` (default: `80`).
    pub snapshot_quality: u8,
    /// Per-request HTTP timeout (default: 10 s).
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            capture_resolution: Resolution::default(),
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            analysis_interval: Duration::from_millis(DEFAULT_ANALYSIS_INTERVAL_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            alert_limit: MAX_ALERTS,
            mask_outbound_frames: true,
            snapshot_quality: DEFAULT_JPEG_QUALITY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `API_BASE_URL`         | `http://localhost:5000` |
    /// | `CAPTURE_WIDTH`        | `640`                   |
    /// | `CAPTURE_HEIGHT`       | `480`                   |
    /// | `REFRESH_RATE_HZ`      | `60`                    |
    /// | `ANALYSIS_INTERVAL_MS` | `500`                   |
    /// | `POLL_INTERVAL_MS`     | `3000`                  |
    /// | `ALERT_LIMIT`          | `20`                    |
    /// | `MASK_OUTBOUND_FRAMES` | `true`                  |
    /// | `SNAPSHOT_QUALITY`     | `80`                    |
    /// | `REQUEST_TIMEOUT_SECS` | `10`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("API_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let width: u32 = parse(&lookup, "CAPTURE_WIDTH", DEFAULT_WIDTH, "a pixel count")?;
        let height: u32 = parse(&lookup, "CAPTURE_HEIGHT", DEFAULT_HEIGHT, "a pixel count")?;
        let capture_resolution = Resolution::new(width, height)?;

        let refresh_rate_hz: u32 =
            parse_positive(&lookup, "REFRESH_RATE_HZ", DEFAULT_REFRESH_RATE_HZ, "between 1 and 240")?;
        if refresh_rate_hz > MAX_REFRESH_RATE_HZ {
            return Err(invalid("REFRESH_RATE_HZ", refresh_rate_hz, "between 1 and 240"));
        }

        let analysis_ms = parse_positive(
            &lookup,
            "ANALYSIS_INTERVAL_MS",
            DEFAULT_ANALYSIS_INTERVAL_MS,
            MILLISECONDS,
        )?;
        let poll_ms =
            parse_positive(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS, MILLISECONDS)?;

        let alert_limit: usize = parse(&lookup, "ALERT_LIMIT", MAX_ALERTS, "a number")?;

        let mask_outbound_frames = match lookup("MASK_OUTBOUND_FRAMES") {
            None => true,
            Some(v) => parse_bool(&v)
                .ok_or_else(|| invalid("MASK_OUTBOUND_FRAMES", v, "true or false"))?,
        };

        let snapshot_quality: u8 =
            parse(&lookup, "SNAPSHOT_QUALITY", DEFAULT_JPEG_QUALITY, "between 1 and 100")?;
        if !(1..=100).contains(&snapshot_quality) {
            return Err(invalid("SNAPSHOT_QUALITY", snapshot_quality, "between 1 and 100"));
        }

        let timeout_secs = parse_positive(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
            "a positive number of seconds",
        )?;

        Ok(Self {
            api_url,
            capture_resolution,
            refresh_rate_hz,
            analysis_interval: Duration::from_millis(analysis_ms),
            poll_interval: Duration::from_millis(poll_ms),
            alert_limit: alert_limit.clamp(1, MAX_ALERTS),
            mask_outbound_frames,
            snapshot_quality,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Time between render cycles.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.refresh_rate_hz.max(1)))
    }
}

fn invalid(key: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        expected,
    }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, raw, expected)),
    }
}

/// [`parse`] that also rejects zero.
fn parse_positive<T, F>(
    lookup: &F,
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq + ToString,
    F: Fn(&str) -> Option<String>,
{
    let value = parse(lookup, key, default, expected)?;
    if value == T::default() {
        return Err(invalid(key, value, expected));
    }
    Ok(value)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
