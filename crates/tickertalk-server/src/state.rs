use crate::configuration::Settings;
use crate::sse::StreamFraming;
use std::sync::Arc;
use tickertalk::{
    prompt::system_instruction,
    providers::{base::CompletionOrchestrator, openai::OpenAiOrchestrator},
    tools::{MarketDataClient, ToolRegistry},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<dyn CompletionOrchestrator>,
    pub tools: Arc<ToolRegistry>,
    pub instruction: Arc<str>,
    pub framing: StreamFraming,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let client = MarketDataClient::new(settings.market.into_config())?;
        let tools = ToolRegistry::from_names(settings.tools.as_slice(), client)?;
        let orchestrator = OpenAiOrchestrator::new(settings.completion.into_config())?;

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            tools: Arc::new(tools),
            instruction: system_instruction(settings.prompt.variant).into(),
            framing: settings.server.framing,
        })
    }
}
