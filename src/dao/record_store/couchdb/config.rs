use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "game_night";

/// Basic-auth pair sent with every CouchDB request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Where the board's CouchDB database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub credentials: Option<Credentials>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` (required), `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Credentials are used only when both halves are present.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let base_url =
            lookup("COUCH_BASE_URL").ok_or(CouchDaoError::MissingEnvVar("COUCH_BASE_URL"))?;
        let credentials = lookup("COUCH_USERNAME")
            .zip(lookup("COUCH_PASSWORD"))
            .map(|(username, password)| Credentials { username, password });

        Ok(Self {
            base_url,
            database: lookup("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn base_url_is_required() {
        assert!(matches!(
            CouchConfig::from_lookup(lookup(&[])),
            Err(CouchDaoError::MissingEnvVar("COUCH_BASE_URL"))
        ));
    }

    #[test]
    fn half_a_credential_pair_is_ignored() {
        let config = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984"),
            ("COUCH_USERNAME", "admin"),
        ]))
        .unwrap();
        assert_eq!(config.database, "game_night");
        assert_eq!(config.credentials, None);

        let config = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://couch:5984"),
            ("COUCH_DB", "board"),
            ("COUCH_USERNAME", "admin"),
            ("COUCH_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.database, "board");
        assert_eq!(
            config.credentials,
            Some(Credentials {
                username: "admin".into(),
                password: "secret".into()
            })
        );
    }
}
