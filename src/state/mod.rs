//! Process-wide shared state: the connection registry (spec §4.5) plus the
//! `Core` dependency-injection container wiring HOT, WARM, the Backplane,
//! and the job queue together for the Gateway and both engines.

pub mod registry;

use crate::backplane::Backplane;
use crate::chat::ChatEngine;
use crate::config::Config;
use crate::hot::HotClient;
use crate::jobqueue::JobQueue;
use crate::location::LocationEngine;
use crate::token::TokenVerifier;
use crate::warm::WarmClient;
use registry::ConnectionRegistry;
use std::sync::Arc;

/// Everything a connection task or background worker needs, held once at
/// process start and cloned cheaply (every field is already an `Arc`).
#[derive(Clone)]
pub struct Core {
    pub config: Arc<Config>,
    pub hot: HotClient,
    pub warm: WarmClient,
    pub registry: Arc<ConnectionRegistry>,
    pub backplane: Arc<Backplane>,
    pub jobs: Arc<JobQueue>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub location: Arc<LocationEngine>,
    pub chat: Arc<ChatEngine>,
}

impl Core {
    pub async fn new(config: Config) -> Result<Self, crate::error::AppError> {
        let config = Arc::new(config);
        let hot = HotClient::connect(&config.hot).await?;
        let warm = WarmClient::connect(&config.warm).await?;

        let registry = ConnectionRegistry::new(hot.clone());
        let backplane = Backplane::start(hot.clone(), registry.clone());
        registry.attach_backplane(backplane.clone());

        let jobs = JobQueue::start(warm.clone(), config.tunables.clone());
        let token_verifier = crate::token::build(&config.token_verifier)?;

        let location = LocationEngine::new(
            hot.clone(),
            warm.clone(),
            backplane.clone(),
            registry.clone(),
            jobs.clone(),
            config.tunables.clone(),
        );
        let chat = ChatEngine::new(
            hot.clone(),
            warm.clone(),
            backplane.clone(),
            registry.clone(),
            jobs.clone(),
            config.tunables.clone(),
        );

        Ok(Self {
            config,
            hot,
            warm,
            registry,
            backplane,
            jobs,
            token_verifier,
            location,
            chat,
        })
    }
}
