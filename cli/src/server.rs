use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use sugarwise_core::limits::{Gauge, LimitWarning};
use sugarwise_core::models::{DailyLimit, FoodItem, MealPlan, NewFoodItem, User};
use sugarwise_core::service::EntryView;
use sugarwise_core::{SugarError, SugarService};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<SugarService>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, SugarService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct FoodQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    healthy: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFoodRequest {
    name: String,
    sugar_content: f64,
    #[serde(default)]
    is_healthy: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomFood {
    name: String,
    sugar_content: f64,
}

/// Foods for a new entry or plan: catalog ids plus inline foods, catalog
/// foods first.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FoodsRequest {
    #[serde(default)]
    food_ids: Vec<String>,
    #[serde(default)]
    custom_foods: Vec<CustomFood>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlanRequest {
    name: String,
    #[serde(flatten)]
    foods: FoodsRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetLimitRequest {
    daily_limit: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest {
    current_total: f64,
    food_id: String,
}

#[derive(Serialize)]
struct SessionResponse {
    user: Option<User>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitResponse {
    daily_limit: DailyLimit,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    food: FoodItem,
    gauge: Gauge,
    warning: Option<LimitWarning>,
    message: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<SugarError> for ApiError {
    fn from(err: SugarError) -> Self {
        match err {
            SugarError::Validation(msg) => Self::BadRequest(msg),
            SugarError::NotLoggedIn => Self::Unauthorized(err.to_string()),
            SugarError::Persistence { .. } => Self::Internal(err.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Helpers ---

/// Catalog foods by id, then inline foods. Inline foods never enter the catalog.
fn collect_foods(svc: &SugarService, req: &FoodsRequest) -> Result<Vec<FoodItem>, ApiError> {
    let mut foods = svc.foods_by_ids(&req.food_ids)?;
    for custom in &req.custom_foods {
        foods.push(FoodItem::inline(&custom.name, &custom.sugar_content.to_string())?);
    }
    Ok(foods)
}

// --- Session handlers ---

async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let svc = state.svc();
    Json(SessionResponse {
        user: svc.session().current_user().cloned(),
    })
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    let mut svc = state.svc();
    let user = svc.login(&req.email, &req.password)?.into_result()?;
    Ok(Json(user))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let mut svc = state.svc();
    let user = svc
        .register(&req.username, &req.email, &req.password)?
        .into_result()?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let mut svc = state.svc();
    svc.logout().into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Catalog handlers ---

async fn list_foods(
    State(state): State<AppState>,
    Query(params): Query<FoodQuery>,
) -> Json<Vec<FoodItem>> {
    let svc = state.svc();
    let foods = svc
        .catalog()
        .browse(&params.q, params.healthy)
        .into_iter()
        .cloned()
        .collect();
    Json(foods)
}

async fn create_food(
    State(state): State<AppState>,
    Json(req): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodItem>), ApiError> {
    let mut svc = state.svc();
    svc.session().require_user()?;
    let food = svc
        .add_food(NewFoodItem {
            name: req.name,
            sugar_content: req.sugar_content,
            is_healthy: req.is_healthy,
        })?
        .into_result()?;
    Ok((StatusCode::CREATED, Json(food)))
}

// --- Entry handlers ---

async fn list_entries(State(state): State<AppState>) -> Json<Vec<EntryView>> {
    Json(state.svc().history())
}

async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntryView>, ApiError> {
    let svc = state.svc();
    let entry = svc
        .ledger()
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Entry {id} not found")))?;
    Ok(Json(svc.entry_view(entry)))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<FoodsRequest>,
) -> Result<(StatusCode, Json<EntryView>), ApiError> {
    let mut svc = state.svc();
    svc.session().require_user()?;
    let foods = collect_foods(&svc, &req)?;
    let entry = svc.add_entry(foods)?.into_result()?;
    Ok((StatusCode::CREATED, Json(svc.entry_view(&entry))))
}

// --- Meal plan handlers ---

async fn list_plans(State(state): State<AppState>) -> Json<Vec<MealPlan>> {
    Json(state.svc().plans().list().to_vec())
}

async fn create_plan(
    State(state): State<AppState>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<MealPlan>), ApiError> {
    let mut svc = state.svc();
    svc.session().require_user()?;
    let foods = collect_foods(&svc, &req.foods)?;
    let plan = svc.add_plan(&req.name, foods)?.into_result()?;
    Ok((StatusCode::CREATED, Json(plan)))
}

// --- Limit handlers ---

async fn get_limit(State(state): State<AppState>) -> Json<LimitResponse> {
    Json(LimitResponse {
        daily_limit: state.svc().daily_limit(),
    })
}

async fn set_limit(
    State(state): State<AppState>,
    Json(req): Json<SetLimitRequest>,
) -> Result<Json<LimitResponse>, ApiError> {
    let mut svc = state.svc();
    svc.session().require_user()?;
    let daily_limit = svc.set_limit(req.daily_limit)?.into_result()?;
    Ok(Json(LimitResponse { daily_limit }))
}

async fn check(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    if !req.current_total.is_finite() || req.current_total < 0.0 {
        return Err(ApiError::BadRequest(
            "currentTotal must be a non-negative number".to_string(),
        ));
    }
    let svc = state.svc();
    let food = svc
        .catalog()
        .get(&req.food_id)
        .cloned()
        .ok_or_else(|| ApiError::BadRequest(format!("Food with id {} not found", req.food_id)))?;
    let warning = svc.check_addition(req.current_total, &food);
    let gauge = svc.gauge(req.current_total + food.sugar_content);
    Ok(Json(CheckResponse {
        message: warning.as_ref().map(ToString::to_string),
        food,
        gauge,
        warning,
    }))
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", get(get_session).delete(logout))
        .route("/api/session/login", post(login))
        .route("/api/session/register", post(register))
        .route("/api/foods", get(list_foods).post(create_food))
        .route("/api/entries", get(list_entries).post(create_entry))
        .route("/api/entries/{id}", get(get_entry))
        .route("/api/plans", get(list_plans).post(create_plan))
        .route("/api/limit", get(get_limit).put(set_limit))
        .route("/api/check", post(check))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four bytes of the key, or `None` when the key is too short
/// to abbreviate or the cut would split a character.
fn key_hint(key: &str) -> Option<String> {
    if key.len() < 8 {
        return None;
    }
    let head = key.get(..4)?;
    let tail = key.get(key.len() - 4..)?;
    Some(format!("{head}...{tail}"))
}

pub async fn start_server(
    svc: SugarService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    match api_key {
        Some(ref key) if new_api_key => {
            eprintln!("Generated new API key: {key}");
            eprintln!("Include in requests: Authorization: Bearer {key}");
        }
        Some(ref key) => match key_hint(key) {
            Some(hint) => eprintln!("API key: {hint} (see api_key file in data directory)"),
            None => eprintln!("API key loaded (see api_key file in data directory)"),
        },
        None => eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone."),
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    tracing::info!(%bind, port, "REST server started");
    axum::serve(listener, app).await?;

    Ok(())
}
