//! Application state wiring all services together.
//!
//! [`Storage`] is what every command needs: the data directory, the loaded
//! configuration and the database. [`AppState`] adds the chat pipeline for
//! the HTTP server. Services are generic over repository and provider
//! traits; the aliases below pin them to the concrete infra types.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ella_core::chat::service::ChatService;
use ella_core::conversation::service::ConversationService;
use ella_core::job::generator::{GeneratorSettings, ResponseGenerator};
use ella_core::job::queue::JobQueue;
use ella_core::job::worker::JobWorker;
use ella_core::llm::box_provider::BoxLlmProvider;
use ella_core::provider::image::ImageGenerator;
use ella_core::provider::search::WebSearchProvider;
use ella_core::user::service::UserService;
use ella_infra::config::load_config;
use ella_infra::crypto::token::Sha256TokenHasher;
use ella_infra::filesystem::{database_url, resolve_data_dir};
use ella_infra::image::nebius::NebiusImages;
use ella_infra::llm::create_provider;
use ella_infra::search::tavily::TavilySearch;
use ella_infra::secret::ProviderKeys;
use ella_infra::sqlite::conversation::SqliteConversationRepository;
use ella_infra::sqlite::job::SqliteJobRepository;
use ella_infra::sqlite::pool::DatabasePool;
use ella_infra::sqlite::user::SqliteUserRepository;
use ella_types::config::AppConfig;

pub type ConcreteConversationService = ConversationService<SqliteConversationRepository>;
pub type ConcreteChatService = ChatService<SqliteConversationRepository, SqliteJobRepository>;
pub type ConcreteUserService = UserService<SqliteUserRepository, Sha256TokenHasher>;

/// Queued run ids waiting for the worker. Submissions beyond this are
/// still persisted and picked up on the next restart.
const QUEUE_CAPACITY: usize = 256;

/// Data directory, configuration and database.
#[derive(Clone)]
pub struct Storage {
    pub data_dir: PathBuf,
    pub config: Arc<AppConfig>,
    pub db_pool: DatabasePool,
}

impl Storage {
    /// Open storage under `ELLA_DATA_DIR` (default `~/.ella`).
    pub async fn open() -> anyhow::Result<Self> {
        Self::open_at(resolve_data_dir()).await
    }

    pub async fn open_at(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("opening the database")?;

        Ok(Self {
            data_dir,
            config: Arc::new(config),
            db_pool,
        })
    }

    pub fn user_service(&self) -> ConcreteUserService {
        UserService::new(
            SqliteUserRepository::new(self.db_pool.clone()),
            Sha256TokenHasher::new(),
        )
    }

    pub fn job_repo(&self) -> SqliteJobRepository {
        SqliteJobRepository::new(self.db_pool.clone())
    }

    pub fn conversation_repo(&self) -> SqliteConversationRepository {
        SqliteConversationRepository::new(self.db_pool.clone())
    }
}

/// Shared state of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub conversation_service: Arc<ConcreteConversationService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub user_service: Arc<ConcreteUserService>,
    pub jobs: SqliteJobRepository,
    pub llm: Arc<BoxLlmProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire the services. The returned receiver carries run ids for the
    /// job worker.
    pub fn new(storage: &Storage, llm: Arc<BoxLlmProvider>) -> (Self, mpsc::Receiver<Uuid>) {
        let (queue, rx) = JobQueue::new(storage.job_repo(), QUEUE_CAPACITY);
        let state = Self {
            conversation_service: Arc::new(ConversationService::new(storage.conversation_repo())),
            chat_service: Arc::new(ChatService::new(storage.conversation_repo(), queue)),
            user_service: Arc::new(storage.user_service()),
            jobs: storage.job_repo(),
            llm,
            config: Arc::clone(&storage.config),
        };
        (state, rx)
    }
}

/// The HTTP state plus the running job worker.
pub struct Runtime {
    pub state: AppState,
    pub worker: JoinHandle<()>,
    pub cancel: CancellationToken,
}

/// Build the providers from the environment, start the worker and
/// re-dispatch runs left unfinished by a previous process.
pub async fn start_runtime(storage: &Storage) -> anyhow::Result<Runtime> {
    let keys = ProviderKeys::from_env();
    let missing = keys.missing();
    let (Some(google), Some(tavily), Some(nebius)) = (keys.google, keys.tavily, keys.nebius)
    else {
        anyhow::bail!("missing provider API keys: {}", missing.join(", "));
    };

    let models = &storage.config.models;
    let llm = Arc::new(create_provider(models, Some(&google))?);
    let search = TavilySearch::new(tavily, &models.search_base_url);
    let images = NebiusImages::new(nebius, &models.image_base_url);

    start_runtime_with(storage, llm, search, images).await
}

/// Same as [`start_runtime`] with explicit providers.
pub async fn start_runtime_with<S, I>(
    storage: &Storage,
    llm: Arc<BoxLlmProvider>,
    search: S,
    images: I,
) -> anyhow::Result<Runtime>
where
    S: WebSearchProvider + 'static,
    I: ImageGenerator + 'static,
{
    let config = &storage.config;
    let (state, rx) = AppState::new(storage, Arc::clone(&llm));

    let generator = ResponseGenerator::new(
        storage.conversation_repo(),
        llm,
        search,
        images,
        GeneratorSettings {
            text_model: config.models.text_model.clone(),
            image_model: config.models.image_model.clone(),
            context_window: config.jobs.context_window,
        },
    );

    let cancel = CancellationToken::new();
    let worker = Arc::new(JobWorker::new(
        Arc::new(generator),
        storage.job_repo(),
        config.jobs.retry(),
        config.jobs.concurrency,
        cancel.clone(),
    ));
    let worker = worker.spawn(rx);

    let resumed = state.chat_service.queue().resume_pending().await?;
    if resumed > 0 {
        tracing::info!(resumed, "Resumed unfinished job runs");
    }

    Ok(Runtime {
        state,
        worker,
        cancel,
    })
}
