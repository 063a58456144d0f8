use fr_core::config::Provider;
use fr_core::{InferenceModel, Result, Settings};
use std::sync::Arc;
use tracing::info;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::{OpenAiConfig, OpenAiModel};

/// Builds the model selected by `INFERENCE_PROVIDER`.
pub fn create_model(settings: &Settings) -> Result<Arc<dyn InferenceModel>> {
    let model: Arc<dyn InferenceModel> = match settings.inference.provider {
        Provider::OpenAi => Arc::new(OpenAiModel::new(OpenAiConfig::from_settings(&settings.inference)?)?),
        Provider::Dummy => Arc::new(DummyModel::new()),
    };
    info!("🤖 Using inference model: {}", model.name());
    Ok(model)
}
