use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::{
    dto::tables::BoardTables,
    services::date_range::{DateInterval, RangeMode},
};

/// Query string of `GET /board`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BoardQuery {
    /// Range mode to render; defaults to the board's selected mode.
    pub mode: Option<RangeMode>,
    /// Client viewport width in pixels, selecting the compact layout when small.
    pub viewport_width: Option<u32>,
}

/// Payload of `PUT /board/range`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RangeUpdateRequest {
    pub mode: RangeMode,
    /// Lower bound, required with the custom mode.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start: Option<OffsetDateTime>,
    /// Upper bound, required with the custom mode.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end: Option<OffsetDateTime>,
    pub viewport_width: Option<u32>,
}

/// Rendered board for one window.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardResponse {
    pub mode: RangeMode,
    pub interval: DateInterval,
    pub tables: BoardTables,
}

/// Query string of the endpoints that answer with refreshed tables.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewportQuery {
    /// Client viewport width in pixels.
    pub viewport_width: Option<u32>,
}
