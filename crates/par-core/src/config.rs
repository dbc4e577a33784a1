use std::time::Duration;

use crate::error::AppError;

/// Slowest accepted rate: one request every 1000 seconds.
pub const MIN_REQUESTS_PER_SECOND: f64 = 0.001;

/// Settings for one rate-limited HTTP client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub requests_per_second: f64,
    pub burst: u32,
    pub timeout: Duration,
    pub max_body_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    /// Defaults tuned for FBref: under one request per second, no burst.
    fn default() -> Self {
        Self {
            requests_per_second: 0.8,
            burst: 1,
            timeout: Duration::from_secs(20),
            max_body_bytes: 2 << 20,
            user_agent: "par-fetcher/1.0".to_string(),
        }
    }
}

impl FetchConfig {
    /// Defaults for the football-data.org API, which tolerates short bursts.
    pub fn football_data() -> Self {
        Self {
            requests_per_second: 3.0,
            burst: 3,
            timeout: Duration::from_secs(15),
            max_body_bytes: 1 << 20,
            ..Self::default()
        }
    }

    /// Bounds-check every field.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.requests_per_second.is_finite()
            || self.requests_per_second < MIN_REQUESTS_PER_SECOND
        {
            return Err(AppError::ConfigError(format!(
                "requests per second must be at least {MIN_REQUESTS_PER_SECOND}, got {}",
                self.requests_per_second
            )));
        }
        if self.burst == 0 {
            return Err(AppError::ConfigError("burst must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(AppError::ConfigError("timeout must be greater than zero".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(AppError::ConfigError(
                "max body size must be at least 1 byte".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::ConfigError("user agent must not be empty".into()));
        }
        Ok(())
    }
}

/// Parse a comma-separated list of season start years.
///
/// Blank entries are skipped. An empty result is an error.
pub fn parse_seasons(raw: &str) -> Result<Vec<u16>, AppError> {
    let mut years = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let year: u16 = part
            .parse()
            .map_err(|_| AppError::ConfigError(format!("bad season year '{part}'")))?;
        if !(1900..=2100).contains(&year) {
            return Err(AppError::ConfigError(format!(
                "season year {year} out of range 1900-2100"
            )));
        }
        years.push(year);
    }
    if years.is_empty() {
        return Err(AppError::ConfigError("no seasons provided".into()));
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FetchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn football_data_preset_allows_bursts() {
        let config = FetchConfig::football_data();
        assert!(config.validate().is_ok());
        assert_eq!(config.burst, 3);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.user_agent, "par-fetcher/1.0");
    }

    #[test]
    fn rejects_out_of_bounds_values() {
        let bad = [
            FetchConfig {
                requests_per_second: 0.0,
                ..FetchConfig::default()
            },
            FetchConfig {
                requests_per_second: f64::NAN,
                ..FetchConfig::default()
            },
            FetchConfig {
                requests_per_second: 1e-20,
                ..FetchConfig::default()
            },
            FetchConfig {
                burst: 0,
                ..FetchConfig::default()
            },
            FetchConfig {
                timeout: Duration::ZERO,
                ..FetchConfig::default()
            },
            FetchConfig {
                max_body_bytes: 0,
                ..FetchConfig::default()
            },
            FetchConfig {
                user_agent: "  ".into(),
                ..FetchConfig::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(AppError::ConfigError(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_season_list() {
        assert_eq!(
            parse_seasons("2020, 2021,,2022 ").unwrap(),
            vec![2020, 2021, 2022]
        );
    }

    #[test]
    fn rejects_bad_season_lists() {
        assert!(matches!(parse_seasons(""), Err(AppError::ConfigError(_))));
        assert!(matches!(parse_seasons(" , "), Err(AppError::ConfigError(_))));
        assert!(matches!(parse_seasons("2020,20x1"), Err(AppError::ConfigError(_))));
        assert!(matches!(parse_seasons("1850"), Err(AppError::ConfigError(_))));
    }
}
