// Axum API Server Module
//
// Purpose: REST endpoints for top-up estimation, grid status, the nearest gas
// supplier search, the transaction history page and usage prediction.
// Static assets from STATIC_DIR and TEMPLATES_DIR are served for every other path.

use axum::{
    async_trait,
    extract::{FromRequest, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::estimator::{parse_amount, validate_amount, Estimate, EstimateError, UtilityEstimator, UtilityKind};
use crate::ledger::{MemoryLog, TransactionLog};
use crate::locator::{load_suppliers, Geocoder, LocateError, SupplierLocator};
use crate::predictor::{ModelRegistry, PredictError, TopUpPeriod, UsagePredictor};
use crate::render::TransactionPage;
use crate::status::{StatusProxy, WATER_STATUS};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub estimator: UtilityEstimator,
    pub locator: Arc<SupplierLocator>,
    pub status: StatusProxy,
    pub page: TransactionPage,
    pub predictor: UsagePredictor,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        Self::with_log(config, Arc::new(MemoryLog::new()))
    }

    /// Build state around an existing transaction log
    pub fn with_log(config: ServerConfig, log: Arc<dyn TransactionLog>) -> anyhow::Result<Self> {
        tracing::info!("Loading gas suppliers from {}...", config.suppliers_path.display());
        let suppliers = load_suppliers(&config.suppliers_path)?;
        tracing::info!("Loaded {} gas suppliers", suppliers.len());

        let http = reqwest::Client::builder().build()?;

        let geocoder = Geocoder::new(http.clone(), &config.geocoder_url, &config.geocoder_user_agent);
        let locator = Arc::new(SupplierLocator::new(geocoder, suppliers));
        let status = StatusProxy::new(http, &config.loadshedding_url);
        let page = TransactionPage::new(&config.templates_dir);

        let registry = match config.model_seed {
            Some(seed) => ModelRegistry::seeded(config.model_ttl, seed),
            None => ModelRegistry::new(config.model_ttl),
        };
        let mut predictor = UsagePredictor::new(registry);
        if let Some(seed) = config.model_seed {
            predictor = predictor.with_seed(seed);
        }

        Ok(Self {
            estimator: UtilityEstimator::new(log),
            locator,
            status,
            page,
            predictor,
            config: Arc::new(config),
        })
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.static_dir)
        .fallback(ServeDir::new(&state.config.templates_dir));

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Top-up estimation
        .route("/api/pay", post(pay))
        .route("/api/predict", get(predict_top_up))

        // Outage status
        .route("/api/loadshedding", get(loadshedding_status))
        .route("/api/waterstatus", get(water_status))

        // Gas supplier search
        .route("/api/find-nearest-gas", post(find_nearest_gas))

        // Transaction history page (must win over the static template of the same name)
        .route("/AllUtility.html", get(all_utility_page))

        .fallback_service(assets)

        // Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http()) // Request logging
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn pay(
    State(state): State<AppState>,
    body: Result<JsonOrForm<PayRequest>, AppError>,
) -> Response {
    let outcome = match body {
        Ok(JsonOrForm(request)) => request.estimate(&state.estimator).map_err(|e| e.to_string()),
        Err(rejection) => Err(rejection.to_string()),
    };

    match outcome {
        Ok(estimate) => {
            tracing::info!("Top-up estimate: {}", estimate.record());
            Json(serde_json::json!({
                "success": true,
                "message": estimate.message(),
            }))
            .into_response()
        }
        Err(message) => {
            tracing::warn!("Rejected top-up request: {}", message);
            failure(StatusCode::BAD_REQUEST, message)
        }
    }
}

async fn predict_top_up(State(state): State<AppState>, Query(query): Query<PredictQuery>) -> Response {
    let (kind, period) = match query.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Rejected prediction request: {}", e);
            return failure(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let today = chrono::Local::now().date_naive();
    match state.predictor.suggest(kind, period, today).await {
        Ok(suggestion) => {
            let mut body = serde_json::json!({
                "success": true,
                "message": suggestion.message(),
            });
            if let (Some(obj), Ok(serde_json::Value::Object(fields))) =
                (body.as_object_mut(), serde_json::to_value(&suggestion))
            {
                obj.extend(fields);
            }
            Json(body).into_response()
        }
        Err(e) => {
            tracing::error!("Usage prediction failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed".to_string())
        }
    }
}

async fn loadshedding_status(State(state): State<AppState>) -> Response {
    match state.status.fetch().await {
        Ok(stage) => stage.into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch load-shedding status from {}: {}", state.status.endpoint(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching loadshedding data").into_response()
        }
    }
}

async fn water_status() -> &'static str {
    WATER_STATUS
}

async fn find_nearest_gas(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<FindGasRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let nearest = state.locator.find_nearest(request.address.as_deref()).await?;

    Ok(Json(serde_json::json!({
        "nearestSupplier": nearest,
    })))
}

async fn all_utility_page(State(state): State<AppState>) -> Response {
    let transactions = state.estimator.log().snapshot();

    match state.page.render(&transactions).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading page").into_response()
        }
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "message": message,
        })),
    )
        .into_response()
}

// ============================================================================
// Request Types
// ============================================================================

/// A form or JSON scalar. Forms always deliver text.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Deserialize, Debug)]
struct PayRequest {
    amount: Option<Scalar>,
    option: Option<Scalar>,
}

impl PayRequest {
    fn amount(&self) -> Result<f64, EstimateError> {
        match &self.amount {
            Some(Scalar::Int(n)) => validate_amount(*n as f64),
            Some(Scalar::Float(n)) => validate_amount(*n),
            Some(Scalar::Text(s)) => parse_amount(s),
            None => Err(EstimateError::InvalidAmount),
        }
    }

    fn utility(&self) -> Result<UtilityKind, EstimateError> {
        match &self.option {
            Some(Scalar::Int(n)) => UtilityKind::from_selector(&n.to_string()),
            Some(Scalar::Text(s)) => UtilityKind::from_selector(s),
            Some(Scalar::Float(_)) | None => Err(EstimateError::UnknownUtility),
        }
    }

    /// The amount is validated before the selector
    fn estimate(&self, estimator: &UtilityEstimator) -> Result<Estimate, EstimateError> {
        let amount = self.amount()?;
        let kind = self.utility()?;
        estimator.estimate(amount, kind)
    }
}

#[derive(Deserialize, Debug)]
struct FindGasRequest {
    address: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PredictQuery {
    option: Option<String>,
    duration: Option<String>,
}

impl PredictQuery {
    fn parse(&self) -> Result<(UtilityKind, TopUpPeriod), PredictError> {
        let kind = self
            .option
            .as_deref()
            .ok_or(PredictError::UnknownUtility)
            .and_then(|s| UtilityKind::from_selector(s).map_err(|_| PredictError::UnknownUtility))?;

        let raw = self.duration.as_deref().unwrap_or("month");
        let period = TopUpPeriod::parse(raw).ok_or_else(|| PredictError::InvalidDuration(raw.to_string()))?;

        Ok((kind, period))
    }
}

/// Deserializes the body as a URL-encoded form when the request says so,
/// otherwise as JSON. A request without a Content-Type carries no fields,
/// so its body is ignored and `T` is built from an empty object.
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Some(content_type) = req.headers().get(CONTENT_TYPE) else {
            let value = serde_json::from_value(serde_json::Value::Object(serde_json::Map::new()))
                .map_err(|e| AppError::Validation(e.to_string()))?;
            return Ok(Self(value));
        };

        let is_form = content_type
            .to_str()
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),
}

impl From<LocateError> for AppError {
    fn from(e: LocateError) -> Self {
        match e {
            LocateError::MissingAddress => AppError::Validation(e.to_string()),
            LocateError::AddressNotFound | LocateError::NoSupplierInRange(_) => AppError::NotFound(e.to_string()),
            LocateError::Upstream(_) | LocateError::InvalidCoordinates(_) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => {
                tracing::error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
