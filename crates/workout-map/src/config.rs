//! Runtime configuration read from the environment.

use std::{collections::BTreeSet, env, path::PathBuf, str::FromStr};

use crate::{
    errors::AppError,
    health::InMemoryHealthStore,
    models::{ActivityType, Coordinate, Region},
};

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    /// Root of the GPX workout library.
    pub data_dir: PathBuf,
    /// Types selected when the screen first appears.
    pub default_types: BTreeSet<ActivityType>,
    pub batch_size: usize,
    pub health_authorized: bool,
    pub location_fix: Option<Coordinate>,
    pub location_authorized: bool,
    pub initial_region: Region,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            data_dir: PathBuf::from("./workouts"),
            default_types: ActivityType::SELECTABLE.into_iter().collect(),
            batch_size: InMemoryHealthStore::DEFAULT_BATCH_SIZE,
            health_authorized: true,
            location_fix: None,
            location_authorized: true,
            initial_region: Region::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = parse_value("PORT", &port)?;
        }
        if let Some(dir) = lookup("WORKOUT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(types) = lookup("DEFAULT_WORKOUT_TYPES") {
            config.default_types = parse_types(&types)?;
        }
        if let Some(size) = lookup("LOCATION_BATCH_SIZE") {
            config.batch_size = parse_value("LOCATION_BATCH_SIZE", &size)?;
            if config.batch_size == 0 {
                return Err(AppError::Config(
                    "LOCATION_BATCH_SIZE must be positive".to_string(),
                ));
            }
        }
        if let Some(flag) = lookup("HEALTH_AUTHORIZED") {
            config.health_authorized = parse_value("HEALTH_AUTHORIZED", &flag)?;
        }
        if let Some(fix) = lookup("LOCATION_FIX") {
            let [lat, lon] = parse_floats::<2>("LOCATION_FIX", &fix)?;
            config.location_fix = Some(Coordinate::new(lat, lon));
        }
        if let Some(flag) = lookup("LOCATION_AUTHORIZED") {
            config.location_authorized = parse_value("LOCATION_AUTHORIZED", &flag)?;
        }
        if let Some(region) = lookup("INITIAL_REGION") {
            let [lat, lon, span] = parse_floats::<3>("INITIAL_REGION", &region)?;
            config.initial_region = Region::new(Coordinate::new(lat, lon), span, span);
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key}: cannot parse {raw:?}")))
}

fn parse_types(raw: &str) -> Result<BTreeSet<ActivityType>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|e| AppError::Config(format!("DEFAULT_WORKOUT_TYPES: {e}")))
        })
        .collect()
}

fn parse_floats<const N: usize>(key: &str, raw: &str) -> Result<[f64; N], AppError> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| parse_value(key, part))
        .collect::<Result<_, _>>()?;

    values
        .try_into()
        .map_err(|_| AppError::Config(format!("{key}: expected {N} comma separated numbers")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_types.len(), 3);
        assert!(!config.default_types.contains(&ActivityType::Other));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("DEFAULT_WORKOUT_TYPES", "running, cycling"),
            ("LOCATION_FIX", "40.015,-105.27"),
            ("INITIAL_REGION", "39.9,-105.3,0.5"),
            ("HEALTH_AUTHORIZED", "false"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.default_types,
            BTreeSet::from([ActivityType::Running, ActivityType::Cycling])
        );
        assert_eq!(config.location_fix, Some(Coordinate::new(40.015, -105.27)));
        assert_eq!(config.initial_region.latitude_delta, 0.5);
        assert!(!config.health_authorized);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("DEFAULT_WORKOUT_TYPES", "swimming")]).is_err());
        assert!(config_from(&[("LOCATION_FIX", "40.0")]).is_err());
        assert!(config_from(&[("LOCATION_BATCH_SIZE", "0")]).is_err());
    }
}
