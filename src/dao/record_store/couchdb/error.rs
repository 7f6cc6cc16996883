use reqwest::StatusCode;
use thiserror::Error;
use uuid::Uuid;

pub type CouchResult<T> = Result<T, CouchDaoError>;

/// CouchDB failures, tagged with the database path they happened on.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("`{0}` must be set to reach CouchDB")]
    MissingEnvVar(&'static str),
    #[error("could not build the CouchDB HTTP client")]
    ClientBuilder(#[source] reqwest::Error),
    #[error("CouchDB did not answer `{path}`")]
    Unreachable {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} to `{path}`")]
    Status { path: String, status: StatusCode },
    #[error("CouchDB body of `{path}` is not JSON")]
    Body {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A row of a listing or `_find` page does not fit the record it is read as.
    #[error("CouchDB row of `{path}` does not fit its record")]
    Shape {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{collection}` has no record `{id}`")]
    MissingDocument { collection: &'static str, id: Uuid },
    #[error("document `{doc_id}` is malformed: {reason}")]
    Malformed { doc_id: String, reason: String },
}
