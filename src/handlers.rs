use std::io;

use actix_web::dev::Service;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse};
use log::{debug, error, info};

use crate::assets::{read_template, render_metrics};
use crate::error::{json_response, ApiError, ApiResult};
use crate::models::{CreateChirpRequest, CreateUserRequest, ListChirpsQuery};
use crate::sanitize::clean_body;
use crate::store::StoreError;
use crate::validation::{
    check_chirp_length, json_config, parse_chirp_id, query_config, require_email, resolve_page,
};
use crate::AppState;

const TEXT_UTF8: &str = "text/plain; charset=utf-8";
const HTML_UTF8: &str = "text/html; charset=utf-8";

fn plain(status: StatusCode, body: &'static str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((CONTENT_TYPE, TEXT_UTF8))
        .body(body)
}

/// Register every route. Expects `web::Data<AppState>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/api")
                .service(healthz)
                .service(create_user)
                .service(create_chirp)
                .service(list_chirps)
                .service(get_chirp),
        )
        .service(web::scope("/admin").service(metrics).service(reset))
        .service(
            web::scope("/app")
                .wrap_fn(|req, srv| {
                    if let Some(state) = req.app_data::<web::Data<AppState>>() {
                        state.hits.record();
                    }
                    srv.call(req)
                })
                .service(serve_asset),
        );
}

#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    plain(StatusCode::OK, "OK")
}

#[get("/metrics")]
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let path = state.metrics_template.clone();
    let template = web::block(move || read_template(&path))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
        .and_then(|read| read);

    match template {
        Ok(template) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, HTML_UTF8))
            .body(render_metrics(&template, state.hits.current())),
        Err(e) => {
            error!("Failed to read metrics template: {:?}", e);
            plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not read metrics.html",
            )
        }
    }
}

#[post("/reset")]
pub async fn reset(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    if !state.is_dev() {
        return Err(ApiError::forbidden(
            "Reset is only allowed in development mode",
        ));
    }

    state.hits.reset();
    state
        .store
        .reset()
        .await
        .map_err(|e| ApiError::internal("Could not reset metrics", e))?;

    info!("Hit counter and store reset");
    Ok(plain(StatusCode::OK, "Metrics reset"))
}

#[post("/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let email = require_email(&payload.email)?;

    let user = state.store.create_user(email).await.map_err(|e| match e {
        StoreError::DuplicateEmail(_) => ApiError::conflict("Email already exists"),
        other => ApiError::internal("Could not create user", other),
    })?;

    info!("User created successfully: {}", user.id);
    Ok(json_response(StatusCode::CREATED, &user))
}

#[post("/chirps")]
pub async fn create_chirp(
    state: web::Data<AppState>,
    payload: web::Json<CreateChirpRequest>,
) -> ApiResult<HttpResponse> {
    let CreateChirpRequest { body, user_id } = payload.into_inner();
    check_chirp_length(&body)?;

    let cleaned = clean_body(&body);
    let chirp = state
        .store
        .create_chirp(&cleaned, user_id)
        .await
        .map_err(|e| ApiError::internal("Could not create chirp", e))?;

    info!("Chirp created successfully: {}", chirp.id);
    Ok(json_response(StatusCode::CREATED, &chirp))
}

#[get("/chirps")]
pub async fn list_chirps(
    state: web::Data<AppState>,
    query: web::Query<ListChirpsQuery>,
) -> ApiResult<HttpResponse> {
    let page = resolve_page(&query)?;

    let chirps = state
        .store
        .list_chirps(page)
        .await
        .map_err(|e| ApiError::internal("Could not retrieve chirps", e))?;

    debug!("Found {} chirps for {:?}", chirps.len(), page);
    Ok(json_response(StatusCode::OK, &chirps))
}

/// Also matches `/chirps/`, so a missing id is reported instead of routed away.
#[get("/chirps/{id:.*}")]
pub async fn get_chirp(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_chirp_id(&id)?;

    let chirp = state.store.get_chirp(id).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found("Chirp not found"),
        other => ApiError::internal("Could not retrieve chirp", other),
    })?;

    Ok(json_response(StatusCode::OK, &chirp))
}

/// Files under the asset root; the enclosing scope counts the hit.
#[get("/{tail:.*}")]
pub async fn serve_asset(state: web::Data<AppState>, tail: web::Path<String>) -> HttpResponse {
    let tail = tail.into_inner();
    let asset = web::block(move || state.assets.read(&tail))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
        .and_then(|read| read);

    match asset {
        Ok(asset) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, asset.content_type))
            .body(asset.bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            plain(StatusCode::NOT_FOUND, "404 page not found")
        }
        Err(e) => {
            error!("Failed to read asset: {:?}", e);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
