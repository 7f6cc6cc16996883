use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    error::AppError,
    offline::network::{AssetRequest, Destination},
    state::SharedState,
};

const FETCH_DEST_HEADER: &str = "sec-fetch-dest";

/// Serve any other GET through the offline cache worker.
pub async fn serve_asset(
    State(state): State<SharedState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let url = uri
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or("/");
    let request = AssetRequest::new(url, destination(&headers));
    debug!(url, destination = ?request.destination, "serving asset");

    let cached = state.offline().fetch(&request).await?;
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, cached.body).into_response();
    if let Some(value) = cached
        .content_type
        .as_deref()
        .and_then(|content_type| HeaderValue::from_str(content_type).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}

fn destination(headers: &HeaderMap) -> Destination {
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    };

    if header_text(FETCH_DEST_HEADER).eq_ignore_ascii_case("document")
        || header_text(header::ACCEPT.as_str()).contains("text/html")
    {
        Destination::Document
    } else {
        Destination::Other
    }
}
