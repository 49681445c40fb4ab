use super::error::{CouchDaoError, CouchResult};

const BASE_URL_ENV: &str = "COUCH_BASE_URL";
const DATABASE_ENV: &str = "COUCH_DB";
const USERNAME_ENV: &str = "COUCH_USERNAME";
const PASSWORD_ENV: &str = "COUCH_PASSWORD";
const DEFAULT_DATABASE: &str = "beach_scoreboard";

/// Where the archive database lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server URL without trailing slash.
    pub base_url: String,
    pub database: String,
    /// Basic-auth pair, only set when both halves are configured.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` (default `beach_scoreboard`) and the
    /// optional `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let non_blank = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = non_blank(BASE_URL_ENV)
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or(CouchDaoError::MissingBaseUrl { var: BASE_URL_ENV })?;
        let database = non_blank(DATABASE_ENV).unwrap_or_else(|| DEFAULT_DATABASE.into());
        let credentials = non_blank(USERNAME_ENV).zip(non_blank(PASSWORD_ENV));

        Ok(Self {
            base_url,
            database,
            credentials,
        })
    }

    pub fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn database_defaults_to_the_scoreboard_archive() {
        let config =
            CouchConfig::from_lookup(lookup(&[(BASE_URL_ENV, "http://couch:5984/")])).unwrap();

        assert_eq!(config.base_url, "http://couch:5984");
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert_eq!(config.credentials, None);
        assert_eq!(config.database_url(), "http://couch:5984/beach_scoreboard");
    }

    #[test]
    fn credentials_need_both_halves() {
        let config = CouchConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "http://couch:5984"),
            (DATABASE_ENV, "finals"),
            (USERNAME_ENV, "scorer"),
        ]))
        .unwrap();
        assert_eq!(config.database, "finals");
        assert_eq!(config.credentials, None);

        let config = CouchConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "http://couch:5984"),
            (USERNAME_ENV, "scorer"),
            (PASSWORD_ENV, "sand"),
        ]))
        .unwrap();
        assert_eq!(
            config.credentials,
            Some(("scorer".to_string(), "sand".to_string()))
        );
    }

    #[test]
    fn base_url_is_required() {
        let err = CouchConfig::from_lookup(lookup(&[(BASE_URL_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, CouchDaoError::MissingBaseUrl { var } if var == BASE_URL_ENV));
    }
}
