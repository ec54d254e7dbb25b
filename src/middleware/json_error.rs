use axum::{
    body::to_bytes,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    response::{JsonApiResponse, log_app_error},
};

const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Prefixes axum puts in front of serde's message on body rejections.
const REJECTION_PREFIXES: [&str; 2] = [
    "Failed to deserialize the JSON body into the target type: ",
    "Failed to parse the request body as JSON: ",
];

/// Rewrites plain-text error bodies from axum's extractors into the JSON envelope.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let message = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => rejection_message(status, &String::from_utf8_lossy(&bytes)),
        Err(_) => default_message(status),
    };
    let app_error = app_error_from_status(status, message);
    if status.is_server_error() {
        log_app_error(&app_error, status);
    }

    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    let mut rewritten = JsonApiResponse::from_error(&app_error).into_response();
    rewritten.headers_mut().extend(parts.headers);
    rewritten
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
        .unwrap_or(false)
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return default_message(status);
    }

    REJECTION_PREFIXES
        .iter()
        .find_map(|prefix| body.strip_prefix(prefix))
        .map(|detail| format!("Invalid request body: {detail}"))
        .unwrap_or_else(|| body.to_string())
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

/// Extractor rejections are the client's fault, so every 4xx that is not
/// one of the statuses the API uses on purpose collapses into 400.
fn app_error_from_status(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::unauthorized(message),
        StatusCode::FORBIDDEN => AppError::forbidden(message),
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::CONFLICT => AppError::conflict(message),
        StatusCode::LOCKED => AppError::locked(message),
        StatusCode::TOO_MANY_REQUESTS => AppError::too_many_requests(message),
        _ if status.is_client_error() => AppError::bad_request(message),
        StatusCode::BAD_GATEWAY => AppError::bad_gateway(message),
        _ => AppError::internal(message),
    }
}
