use serde::de::DeserializeOwned;
use serde::Deserialize;
use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::config::QuerySection;
use crate::engine::Engine;
use crate::error::QueryError;
use crate::model::parse_enum;
use crate::notify::NotificationRequest;
use crate::query::PostFilters;

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub query: QuerySection,
}

impl AppState {
    pub fn new(engine: Engine, query: QuerySection) -> Self {
        Self { engine, query }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/replies", get(post_replies))
        .route("/threads/{id}", get(get_thread))
        .route("/feed", get(feed))
        .route("/profiles", get(list_profiles))
        .route("/profiles/{id}", get(get_profile))
        .route("/profiles/{id}/posts", get(profile_posts))
        .route("/profiles/{id}/relationships", get(profile_relationships))
        .route("/profiles/{id}/connections", get(profile_connections))
        .route("/profiles/{id}/connections/grouped", get(profile_connection_groups))
        .route("/profiles/{id}/likes", get(profile_likes))
        .route("/handles/{handle}", get(get_by_handle))
        .route("/eras", get(list_eras))
        .route("/eras/{id}", get(get_era))
        .route("/eras/{id}/profiles", get(era_profiles))
        .route("/search", get(search))
        .route("/trending", get(trending))
        .route("/trending/hashtags", get(trending_hashtags))
        .route("/top/posts", get(top_posts))
        .route("/top/profiles", get(top_profiles))
        .route("/suggested", get(suggested))
        .route("/relationships/{a}/{b}", get(relationship_between))
        .route("/notifications/generate", post(generate_notifications))
        .route("/corpus/report", get(corpus_report))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Handler failure rendered as `{ "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

type ApiResult = Result<Response, ApiError>;

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::NotFound(format!("{what} not found: {id}"))
}

/// Comma-separated enum list. Unknown names fail in strict mode and are dropped otherwise.
fn parse_list<T: DeserializeOwned>(
    field: &'static str,
    raw: Option<&str>,
    strict: bool,
) -> Result<Vec<T>, QueryError> {
    let mut out = Vec::new();
    for item in raw.unwrap_or_default().split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match parse_enum::<T>(item) {
            Some(v) => out.push(v),
            None if strict => {
                return Err(QueryError::InvalidFilter {
                    field,
                    value: item.to_string(),
                })
            }
            None => debug!(target: "query", field, value = item, "ignoring unknown filter value"),
        }
    }
    Ok(out)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostsParams {
    era: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    author_id: Option<String>,
    types: Option<String>,
    accuracy: Option<String>,
    hashtag: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct EraLimitParams {
    era: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedParams {
    cursor: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

async fn list_posts(State(state): State<AppState>, Query(q): Query<PostsParams>) -> ApiResult {
    let strict = state.engine.options().strict;
    let filters = PostFilters {
        era: q.era,
        start_date: q.start_date,
        end_date: q.end_date,
        author_id: q.author_id,
        types: parse_list("types", q.types.as_deref(), strict)?,
        accuracy: parse_list("accuracy", q.accuracy.as_deref(), strict)?,
        hashtag: q.hashtag,
        search: q.search,
    };
    let posts = state.engine.posts(&filters)?;
    Ok(Json(posts).into_response())
}

async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let post = state.engine.post(&id).ok_or_else(|| not_found("post", &id))?;
    Ok(Json(post).into_response())
}

async fn post_replies(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.engine.post(&id).is_none() {
        return Err(not_found("post", &id));
    }
    Ok(Json(state.engine.replies(&id)).into_response())
}

async fn get_thread(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let posts = state.engine.thread(&id);
    if posts.is_empty() {
        return Err(not_found("thread", &id));
    }
    Ok(Json(posts).into_response())
}

async fn feed(State(state): State<AppState>, Query(q): Query<FeedParams>) -> ApiResult {
    let limit = state.query.limit(q.limit, state.query.feed_limit);
    let segment = state.engine.feed_segment(q.cursor.as_deref(), limit)?;
    Ok(Json(segment).into_response())
}

async fn list_profiles(State(state): State<AppState>) -> Response {
    Json(state.engine.profiles()).into_response()
}

async fn get_profile(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let p = state.engine.profile(&id).ok_or_else(|| not_found("profile", &id))?;
    Ok(Json(p).into_response())
}

async fn profile_posts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.engine.profile(&id).is_none() {
        return Err(not_found("profile", &id));
    }
    Ok(Json(state.engine.posts_by_author(&id)).into_response())
}

async fn profile_relationships(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let p = state.engine.profile(&id).ok_or_else(|| not_found("profile", &id))?;
    Ok(Json(&p.relationships).into_response())
}

async fn profile_connections(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.engine.profile(&id).is_none() {
        return Err(not_found("profile", &id));
    }
    Ok(Json(state.engine.connected_profiles(&id)).into_response())
}

async fn profile_connection_groups(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    if state.engine.profile(&id).is_none() {
        return Err(not_found("profile", &id));
    }
    Ok(Json(state.engine.grouped_connections(&id)).into_response())
}

async fn profile_likes(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let scores = state
        .engine
        .simulated_likes(&id)
        .ok_or_else(|| not_found("profile", &id))?;
    Ok(Json(scores).into_response())
}

async fn get_by_handle(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult {
    let p = state
        .engine
        .profile_by_handle(&handle)
        .ok_or_else(|| not_found("handle", &handle))?;
    Ok(Json(p).into_response())
}

async fn list_eras(State(state): State<AppState>) -> Response {
    Json(state.engine.eras()).into_response()
}

async fn get_era(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let e = state.engine.era(&id).ok_or_else(|| not_found("era", &id))?;
    Ok(Json(e).into_response())
}

async fn era_profiles(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.engine.era(&id).is_none() {
        return Err(not_found("era", &id));
    }
    Ok(Json(state.engine.profiles_by_era(&id)).into_response())
}

async fn search(State(state): State<AppState>, Query(q): Query<SearchParams>) -> Response {
    let limit = state.query.limit(q.limit, state.query.search_limit);
    let results = state.engine.search(q.q.as_deref().unwrap_or_default(), limit);
    Json(results).into_response()
}

async fn trending(State(state): State<AppState>, Query(q): Query<LimitParams>) -> Response {
    let limit = state.query.limit(q.limit, state.query.trending_limit);
    Json(state.engine.trending(limit)).into_response()
}

async fn trending_hashtags(State(state): State<AppState>, Query(q): Query<EraLimitParams>) -> Response {
    let limit = state.query.limit(q.limit, state.query.trending_limit);
    Json(state.engine.trending_hashtags(q.era.as_deref(), limit)).into_response()
}

async fn top_posts(State(state): State<AppState>, Query(q): Query<EraLimitParams>) -> Response {
    let limit = state.query.limit(q.limit, state.query.top_limit);
    Json(state.engine.top_posts(q.era.as_deref(), limit)).into_response()
}

async fn top_profiles(State(state): State<AppState>, Query(q): Query<LimitParams>) -> Response {
    let limit = state.query.limit(q.limit, state.query.top_limit);
    Json(state.engine.top_profiles(limit)).into_response()
}

async fn suggested(State(state): State<AppState>, Query(q): Query<LimitParams>) -> Response {
    let limit = state.query.limit(q.limit, state.query.top_limit);
    Json(state.engine.suggested_profiles(limit)).into_response()
}

async fn relationship_between(
    State(state): State<AppState>,
    Path((a, b)): Path<(String, String)>,
) -> ApiResult {
    let r = state
        .engine
        .relationship_between(&a, &b)
        .ok_or_else(|| ApiError::NotFound(format!("no relationship between {a} and {b}")))?;
    Ok(Json(r).into_response())
}

async fn generate_notifications(
    State(state): State<AppState>,
    Json(req): Json<NotificationRequest>,
) -> Response {
    Json(state.engine.generate_notifications(req)).into_response()
}

async fn corpus_report(State(state): State<AppState>) -> Response {
    Json(state.engine.corpus().report()).into_response()
}
