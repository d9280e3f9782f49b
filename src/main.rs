//! Service entry point — voice intent bridge.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Read [`BridgeConfig`] from the environment.
//! 3. Build the Ollama gateway and prompt builder.
//! 4. Create the bounded transcription queue.
//! 5. Create the bus client and its publish handle.
//! 6. Spawn the pipeline worker on the tokio runtime.
//! 7. Run the bus event loop — blocks forever; only process termination
//!    stops the service.

use std::sync::Arc;

use tokio::sync::mpsc;
use voice_intent_bridge::{
    bus::BusClient,
    config::BridgeConfig,
    llm::{LlmGateway, OllamaGateway, PromptBuilder},
    pipeline::{IntentPipeline, QUEUE_CAPACITY},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-intent-bridge starting up");

    // 2. Configuration
    let config = BridgeConfig::from_env()?;
    log::info!(
        "LLM endpoint {} (model {})",
        config.llm.base_url(),
        config.llm.model
    );
    log::info!(
        "bus broker {}:{} ({} -> {})",
        config.bus.host,
        config.bus.port,
        config.bus.topic_text,
        config.bus.topic_intent
    );

    // 3. LLM gateway
    let gateway: Arc<dyn LlmGateway> = Arc::new(OllamaGateway::from_config(&config.llm));

    // 4. Work queue between the bus loop and the extraction worker
    let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);

    // 5. Bus client + publish handle
    let (bus, publisher) = BusClient::new(&config.bus, queue_tx);

    // 6. Pipeline worker
    let pipeline = IntentPipeline::new(
        PromptBuilder::new(),
        gateway,
        Arc::new(publisher),
        config.bus.topic_intent.clone(),
    );
    tokio::spawn(pipeline.run(queue_rx));

    // 7. Bus event loop (reconnects forever, never returns)
    bus.run().await;

    Ok(())
}
