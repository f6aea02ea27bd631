use std::env::{self, VarError};

use crate::{errors::AppError, Service};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Reads `DATABASE_URL`, `HOST` and `PORT`, falling back to the service defaults.
    pub fn from_env(service: Service) -> Result<Self, AppError> {
        Self::from_lookup(service, |key| env::var(key))
    }

    pub fn from_lookup<F>(service: Service, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let var = |key: &str| match lookup(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(e) => Err(AppError::EnvVarError(e)),
        };

        let database_url = var("DATABASE_URL")?
            .unwrap_or_else(|| service.default_database_url().to_owned());
        let host = var("HOST")?.unwrap_or_else(|| "127.0.0.1".to_owned());
        let port = match var("PORT")? {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| AppError::InvalidConfig(format!("PORT={raw:?}: {e}")))?,
            None => service.default_port(),
        };

        Ok(Config {
            database_url,
            host,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn each_service_has_its_own_defaults() {
        let admin = Config::from_lookup(Service::Admin, lookup(&[])).unwrap();
        let results = Config::from_lookup(Service::Results, lookup(&[])).unwrap();

        assert_eq!(admin.database_url, "sqlite://user_testing_admin.db");
        assert_eq!(results.database_url, "sqlite://user_testing_results.db");
        assert_eq!(admin.port, 5000);
        assert_eq!(results.port, 5001);
        assert_eq!(admin.host, "127.0.0.1");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(
            Service::Results,
            lookup(&[
                ("DATABASE_URL", "sqlite://shared.db"),
                ("HOST", "0.0.0.0"),
                ("PORT", "8080"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                database_url: "sqlite://shared.db".into(),
                host: "0.0.0.0".into(),
                port: 8080,
            }
        );
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(Service::Admin, lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }
}
