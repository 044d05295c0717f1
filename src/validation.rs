//! Request checks that run before any store call.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use log::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{ListChirpsQuery, Page};

pub const MAX_CHIRP_LEN: usize = 140;

/// Largest request body the JSON extractor will buffer.
pub const MAX_JSON_BYTES: usize = 16 * 1024;

/// Limit on the raw body, counted in UTF-8 bytes before any masking.
pub fn check_chirp_length(body: &str) -> ApiResult<()> {
    if body.len() > MAX_CHIRP_LEN {
        return Err(ApiError::validation("Chirp is too long"));
    }
    Ok(())
}

pub fn require_email(email: &str) -> ApiResult<&str> {
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    Ok(email)
}

pub fn parse_chirp_id(raw: &str) -> ApiResult<Uuid> {
    if raw.is_empty() {
        return Err(ApiError::validation("Chirp ID is required"));
    }
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("Invalid Chirp ID format"))
}

/// Resolve optional paging parameters against the fixed default page.
pub fn resolve_page(query: &ListChirpsQuery) -> ApiResult<Page> {
    let mut page = Page::default();
    if let Some(limit) = query.limit {
        if limit == 0 || limit > Page::MAX_LIMIT {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {}",
                Page::MAX_LIMIT
            )));
        }
        page.limit = limit;
    }
    if let Some(offset) = query.offset {
        let max_offset = Page::MAX_WINDOW - page.limit;
        if offset > max_offset {
            return Err(ApiError::validation(format!(
                "offset must be at most {max_offset}"
            )));
        }
        page.offset = offset;
    }
    Ok(page)
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected JSON payload for {}: {err}", req.path());
    ApiError::validation("Invalid JSON format").into()
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected query string for {}: {err}", req.path());
    ApiError::validation("Invalid query parameters").into()
}

/// Extractor settings that turn decode failures into error envelopes.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .limit(MAX_JSON_BYTES)
        .error_handler(json_error_handler)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}
