//! HTTP inference endpoint.
//!
//! The model is loaded once into an [`AppContext`] at startup and shared with
//! every request through axum state. Inference runs through the cache-free
//! path of the layers, so concurrent requests only ever read the parameters.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, error, info};
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::prelude::*;

/// Shared per-process state handed to every handler.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    model: Option<Arc<TwoLayerNetwork>>,
}

impl AppContext {
    pub fn new(model: Option<TwoLayerNetwork>) -> Self {
        Self {
            model: model.map(Arc::new),
        }
    }

    /// Loads the parameter file; a failure is logged and leaves the context
    /// without a model so requests are answered with `ModelNotReady`.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Parameters::load(path).and_then(TwoLayerNetwork::from_parameters) {
            Ok(network) => {
                info!("Model '{}' loaded successfully.", path.display());
                Self::new(Some(network))
            }
            Err(err) => {
                error!("Failed to load model '{}': {}", path.display(), err);
                Self::new(None)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.as_ref().is_some_and(|model| model.is_ready())
    }

    pub fn predict(&self, image: &[f64]) -> Result<usize> {
        let model = self.model.as_ref().ok_or(NNError::ModelNotReady)?;
        model.predict(image)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PredictRequest {
    pub image: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PredictResponse {
    pub prediction: usize,
}

/// Library error rendered as `{"detail": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub NNError);

impl From<NNError> for ApiError {
    fn from(err: NNError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NNError::ShapeMismatch(_) | NNError::ShapeError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

pub fn router(context: AppContext) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(context)
}

pub async fn predict(
    State(context): State<AppContext>,
    Json(request): Json<PredictRequest>,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let prediction = context.predict(&request.image)?;
    debug!("predicted {} for a {}-pixel image", prediction, request.image.len());
    Ok(Json(PredictResponse { prediction }))
}

pub async fn health(State(context): State<AppContext>) -> Json<serde_json::Value> {
    let status = if context.is_ready() { "ok" } else { "model_not_loaded" };
    Json(json!({ "status": status }))
}

/// Loads the model named by `config` and serves until ctrl-c.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let context = AppContext::load(&config.model_path);
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    axum::serve(listener, router(context))
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("received ctrl-c, shutting down");
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn zero_context() -> AppContext {
        let architecture = Architecture::digits(10).unwrap();
        let parameters = Parameters {
            architecture,
            w1: Array2::zeros(architecture.w1_shape()),
            b1: Array2::zeros(architecture.b1_shape()),
            w2: Array2::zeros(architecture.w2_shape()),
            b2: Array2::zeros(architecture.b2_shape()),
        };
        AppContext::new(Some(TwoLayerNetwork::from_parameters(parameters).unwrap()))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predicts_with_loaded_model() {
        let request = PredictRequest { image: vec![127.5; 784] };
        let Json(response) = predict(State(zero_context()), Json(request)).await.unwrap();
        assert_eq!(response, PredictResponse { prediction: 0 });
    }

    #[tokio::test]
    async fn missing_model_is_a_server_error() {
        let request = PredictRequest { image: vec![0.0; 784] };
        let err = predict(State(AppContext::default()), Json(request)).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "Model is not loaded on the server." })
        );
    }

    #[tokio::test]
    async fn wrong_image_length_is_unprocessable() {
        let request = PredictRequest { image: vec![0.0; 100] };
        let err = predict(State(zero_context()), Json(request)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_readiness() {
        let Json(ready) = health(State(zero_context())).await;
        assert_eq!(ready, json!({ "status": "ok" }));
        let Json(missing) = health(State(AppContext::default())).await;
        assert_eq!(missing, json!({ "status": "model_not_loaded" }));
    }

    #[test]
    fn unreadable_model_file_leaves_context_unready() {
        let context = AppContext::load("/nonexistent/trained_model.npz");
        assert!(!context.is_ready());
        assert!(matches!(context.predict(&[0.0; 784]), Err(NNError::ModelNotReady)));
    }
}
