use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub option_a: String,
    pub option_b: String,
    pub error_sim_enabled: bool,
    pub error_sim_rate: f64,
    pub error_sim_auto_disable_seconds: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8080"),
            redis_url: try_load("REDIS_URL", "redis://redis:6379"),
            option_a: try_load("OPTION_A", "Cats"),
            option_b: try_load("OPTION_B", "Dogs"),
            error_sim_enabled: load_flag("ERROR_SIM_ENABLED", "false"),
            error_sim_rate: load_rate("ERROR_SIM_RATE", "0.5"),
            error_sim_auto_disable_seconds: try_load("ERROR_SIM_AUTO_DISABLE_SECONDS", "300"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_flag(key: &str, default: &str) -> bool {
    let raw: String = try_load(key, default);

    parse_flag(&raw)
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

// Deployment manifests spell booleans every which way; accept any casing.
fn parse_flag(value: &str) -> Result<bool, std::str::ParseBoolError> {
    value.to_lowercase().parse()
}

fn load_rate(key: &str, default: &str) -> f64 {
    let rate: f64 = try_load(key, default);

    validate_rate(rate)
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn validate_rate(rate: f64) -> Result<f64, String> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("error rate {rate} outside [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, validate_rate};

    #[test]
    fn test_valid_rates() {
        assert_eq!(validate_rate(0.0), Ok(0.0));
        assert_eq!(validate_rate(0.5), Ok(0.5));
        assert_eq!(validate_rate(1.0), Ok(1.0));
    }

    #[test]
    fn test_invalid_rates() {
        assert!(validate_rate(-0.1).is_err());
        assert!(validate_rate(1.5).is_err());
        assert!(validate_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_flag_ignores_case() {
        assert_eq!(parse_flag("true"), Ok(true));
        assert_eq!(parse_flag("True"), Ok(true));
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag("False"), Ok(false));
    }

    #[test]
    fn test_flag_rejects_garbage() {
        assert!(parse_flag("yes").is_err());
        assert!(parse_flag("1").is_err());
        assert!(parse_flag("").is_err());
    }
}
