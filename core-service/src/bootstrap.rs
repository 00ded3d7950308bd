//! Process-start wiring
//!
//! Every client is built once here and shared by reference; nothing is kept in
//! globals.

use bridge_traits::http::HttpClient;
use bridge_traits::registry::{ArtistRegistry, UserRegistry};
use core_auth::{ClientCredentialsConfig, ClientCredentialsFlow, DefaultCredentialProvider, ProviderKind};
use core_library::{create_pool, ArtistRepository, DatabaseConfig, SqliteArtistRepository};
use core_runtime::config::ServiceConfig;
use core_runtime::events::EventBus;
use core_sync::{CatalogClient, Reconciler, SyncCoordinator};
use provider_spotify::SpotifyConnector;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::Result;
use crate::queue::MessageDispatcher;
use crate::service::CatalogService;

/// Host-supplied collaborators the service cannot build itself.
pub struct ServiceDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub users: Arc<dyn UserRegistry>,
    /// Downstream registry every artist is mirrored to once
    pub artist_registry: Option<Arc<dyn ArtistRegistry>>,
    pub event_bus: Option<EventBus>,
}

impl ServiceDependencies {
    pub fn new(http_client: Arc<dyn HttpClient>, users: Arc<dyn UserRegistry>) -> Self {
        Self {
            http_client,
            users,
            artist_registry: None,
            event_bus: None,
        }
    }

    /// Use the reqwest client with the configured request timeout.
    ///
    /// Transport retries are disabled; the provider connector retries 429 and
    /// 5xx itself and honors `Retry-After`.
    #[cfg(feature = "server")]
    pub fn server(config: &ServiceConfig, users: Arc<dyn UserRegistry>) -> Result<Self> {
        let http_client = bridge_server::ReqwestHttpClient::with_timeout(config.http_timeout)?
            .with_retry_policy(bridge_traits::http::RetryPolicy::none());
        Ok(Self::new(Arc::new(http_client), users))
    }

    pub fn with_artist_registry(mut self, registry: Arc<dyn ArtistRegistry>) -> Self {
        self.artist_registry = Some(registry);
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }
}

/// The RPC façade and the queue dispatcher over one shared pipeline.
pub struct CatalogRuntime {
    pub service: CatalogService,
    pub dispatcher: MessageDispatcher,
}

/// Install the tracing subscriber selected by `APP_ENV`.
pub fn init_logging(config: &ServiceConfig) -> Result<()> {
    core_runtime::logging::init_logging(config.logging())?;
    Ok(())
}

/// Open the store, run migrations and assemble the pipeline.
#[instrument(skip_all, fields(database = %config.database_path.display()))]
pub async fn bootstrap(config: &ServiceConfig, deps: ServiceDependencies) -> Result<CatalogRuntime> {
    config.validate()?;

    let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
    let artists: Arc<dyn ArtistRepository> = Arc::new(SqliteArtistRepository::new(pool));

    let flow = ClientCredentialsFlow::new(
        ClientCredentialsConfig::new(
            ProviderKind::Spotify,
            config.client_id.clone(),
            config.client_secret.clone(),
            config.token_url.clone(),
        ),
        deps.http_client.clone(),
    );
    let mut credentials = DefaultCredentialProvider::new(flow, deps.users);

    let connector =
        SpotifyConnector::new(deps.http_client.clone()).with_api_base(config.api_base_url.clone());

    let mut reconciler = Reconciler::new(artists.clone());
    if let Some(registry) = deps.artist_registry {
        reconciler = reconciler.with_registry(registry);
    }

    if let Some(bus) = &deps.event_bus {
        credentials = credentials.with_event_bus(bus.clone());
    }

    let mut coordinator = SyncCoordinator::new(
        Arc::new(credentials),
        CatalogClient::new(Arc::new(connector)),
        reconciler,
        config.sync.clone(),
    );
    if let Some(bus) = deps.event_bus {
        coordinator = coordinator.with_event_bus(bus);
    }
    let coordinator = Arc::new(coordinator);

    info!(
        api_base = %config.api_base_url,
        failure_policy = ?config.sync.failure_policy,
        "Catalog service ready"
    );

    Ok(CatalogRuntime {
        service: CatalogService::new(coordinator.clone(), artists),
        dispatcher: MessageDispatcher::new(coordinator),
    })
}
