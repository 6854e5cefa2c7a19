use crate::{
    config::{Config, PredictorConfig},
    predictor::{CannedImageDiagnosis, Predictor, ScriptPredictor},
    routes::api_routes,
    telemetry::Metrics,
};
use axum::Router;
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// One predictor per prediction route.
#[derive(Clone)]
pub struct Predictors {
    pub crop_recommendation: Arc<dyn Predictor>,
    pub disease_detection: Arc<dyn Predictor>,
    pub market_price: Arc<dyn Predictor>,
    pub image_diagnosis: Arc<dyn Predictor>,
}

impl Predictors {
    pub fn from_config(config: &PredictorConfig) -> Self {
        let scripts = &config.scripts;
        Self {
            crop_recommendation: Arc::new(ScriptPredictor::from_config(
                config,
                &scripts.crop_recommendation,
            )),
            disease_detection: Arc::new(ScriptPredictor::from_config(
                config,
                &scripts.disease_detection,
            )),
            market_price: Arc::new(ScriptPredictor::from_config(config, &scripts.market_price)),
            image_diagnosis: Arc::new(CannedImageDiagnosis),
        }
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub predictors: Predictors,
    pub metrics: Arc<Metrics>,
}

/// Routes plus the layers every request goes through.
pub fn app_router(state: SharedState) -> Router {
    let metrics_layer = HttpMetricsLayerBuilder::new().build();

    Router::new()
        .merge(api_routes())
        .with_state(state)
        .layer(metrics_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(predictors: Predictors, config: &Config) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let metrics = Arc::new(Metrics::new()?);
        let app_state = SharedState {
            predictors,
            metrics,
        };

        let router = app_router(app_state);
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("ML service running on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn({
            let mut shutdown_rx = shutdown_rx.resubscribe();
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown_rx.recv().await.ok();
                    })
                    .await?;
                Ok(())
            }
        });

        Ok(server_handle)
    }
}
