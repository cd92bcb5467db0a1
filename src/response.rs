use axum::{
    Json,
    http::StatusCode as HttpStatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper
///
/// Provides a consistent response format for all API endpoints.
///
/// # Example
/// ```rust,ignore
/// async fn market(Inject(service): Inject<CoinService>) -> ApiResponse<Market> {
///     match service.market().await {
///         Some(market) => ApiResponse::success(market),
///         None => ApiResponse::error(HttpStatusCode::NOT_FOUND, "Market not found"),
///     }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    pub success: bool,

    #[serde(skip)]
    pub http_status: HttpStatusCode,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    ///
    /// Defaults to HTTP 200 OK.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            success: true,
            http_status: HttpStatusCode::OK,
        }
    }

    /// Create an error response carrying the status code and a message.
    pub fn error(status: HttpStatusCode, message: impl Into<String>) -> ApiResponse<T> {
        ApiResponse {
            data: None,
            error: Some(ApiError {
                code: status.as_u16(),
                message: message.into(),
            }),
            success: false,
            http_status: status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}
