use crate::types::Expression;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_body_bytes: usize,

    // Detector configuration
    pub detector: DetectorMode,
    pub detector_url: String,
    pub detector_timeout_ms: u64,

    // System of record
    pub main_api_url: String,
    pub publish_timeout_ms: u64,

    // Session retention
    pub session_max_age_hours: i64,
    pub reclaim_interval_secs: u64,

    // Scoring
    pub analysis: AnalysisConfig,
}

/// Ten years; longer retention is a configuration mistake
const MAX_SESSION_AGE_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorMode {
    /// HTTP inference service
    Remote,
    /// Synthetic faces, no model required
    Stub,
}

/// Heuristic thresholds and expression sets used by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub eye_contact_threshold: f64,
    /// Degrees of yaw/pitch beyond which a frame counts as distracted
    pub distraction_threshold: f64,
    pub confident_expressions: Vec<Expression>,
    pub nervous_expressions: Vec<Expression>,
    pub natural_transitions: Vec<(Expression, Expression)>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        use Expression::*;
        Self {
            eye_contact_threshold: 0.7,
            distraction_threshold: 15.0,
            confident_expressions: vec![Happy, Neutral],
            nervous_expressions: vec![Fearful, Sad, Surprised],
            natural_transitions: vec![
                (Neutral, Happy),
                (Happy, Neutral),
                (Neutral, Surprised),
                (Surprised, Neutral),
                (Neutral, Sad),
                (Sad, Neutral),
                (Happy, Surprised),
                (Surprised, Happy),
            ],
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            eye_contact_threshold: parse_or("EYE_CONTACT_THRESHOLD", defaults.eye_contact_threshold)?,
            distraction_threshold: parse_or("DISTRACTION_THRESHOLD", defaults.distraction_threshold)?,
            confident_expressions: match env::var("CONFIDENT_EXPRESSIONS") {
                Ok(list) => parse_expressions(&list)?,
                Err(_) => defaults.confident_expressions,
            },
            nervous_expressions: match env::var("NERVOUS_EXPRESSIONS") {
                Ok(list) => parse_expressions(&list)?,
                Err(_) => defaults.nervous_expressions,
            },
            natural_transitions: defaults.natural_transitions,
        })
    }

    pub fn is_natural_transition(&self, from: Expression, to: Expression) -> bool {
        self.natural_transitions.contains(&(from, to))
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .or_else(|_| env::var("CV_SERVER_PORT"))
            .unwrap_or_else(|_| "4000".to_string())
            .parse()?;

        let detector = match env::var("DETECTOR_MODE").as_deref() {
            Ok("stub") => DetectorMode::Stub,
            Ok("remote") | Err(_) => DetectorMode::Remote,
            Ok(other) => anyhow::bail!("unknown DETECTOR_MODE: {}", other),
        };

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            max_body_bytes: parse_or("MAX_BODY_BYTES", 50 * 1024 * 1024)?,

            detector,
            detector_url: env::var("DETECTOR_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),
            detector_timeout_ms: parse_or("DETECTOR_TIMEOUT_MS", 5_000)?,

            main_api_url: env::var("MAIN_API_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api".to_string()),
            publish_timeout_ms: parse_or("PUBLISH_TIMEOUT_MS", 10_000)?,

            session_max_age_hours: parse_or("SESSION_MAX_AGE_HOURS", 24)?,
            reclaim_interval_secs: parse_or("RECLAIM_INTERVAL_SECS", 60 * 60)?,

            analysis: AnalysisConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stop the reclaimer or overflow the clock
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.reclaim_interval_secs == 0 {
            anyhow::bail!("RECLAIM_INTERVAL_SECS must be greater than 0");
        }
        if !(1..=MAX_SESSION_AGE_HOURS).contains(&self.session_max_age_hours) {
            anyhow::bail!(
                "SESSION_MAX_AGE_HOURS must be between 1 and {}, got {}",
                MAX_SESSION_AGE_HOURS,
                self.session_max_age_hours
            );
        }
        Ok(())
    }

    pub fn session_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_max_age_hours.clamp(1, MAX_SESSION_AGE_HOURS))
    }

    pub fn reclaim_interval(&self) -> Duration {
        Duration::from_secs(self.reclaim_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            cors_origin: "*".to_string(),
            max_body_bytes: 50 * 1024 * 1024,
            detector: DetectorMode::Stub,
            detector_url: "http://127.0.0.1:5000".to_string(),
            detector_timeout_ms: 5_000,
            main_api_url: "http://localhost:3000/api".to_string(),
            publish_timeout_ms: 10_000,
            session_max_age_hours: 24,
            reclaim_interval_secs: 60 * 60,
            analysis: AnalysisConfig::default(),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => Ok(raw.trim().parse()?),
        Err(_) => Ok(default),
    }
}

fn parse_expressions(list: &str) -> anyhow::Result<Vec<Expression>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}
