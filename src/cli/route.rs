//! CLI route: single route table and run context. Dispatches to the
//! orchestrator and session router, then to presentation.

use crate::cli::output::CliError;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_published, format_review, format_snapshot, format_status, format_thread_list,
};
use crate::config::{ConfigLoader, PostflowConfig, StorageBackend};
use crate::engine::{GenerationEngine, LlmEngine, StateDelta};
use crate::error::{EngineError, WorkflowError};
use crate::session::{InMemorySessionRouter, SessionRouter, SledSessionRouter};
use crate::store::{InMemoryThreadStore, SledThreadStore, ThreadStore};
use crate::types::{SessionKey, ThreadId};
use crate::workflow::{Decision, Orchestrator, Phase, WorkflowState};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const RESTART_HINT: &str = "No active post. Start one with `postflow start <topic>`.";

pub type SharedStore = Arc<dyn ThreadStore>;
pub type SharedEngine = Arc<dyn GenerationEngine>;

/// Runtime context for CLI execution: orchestrator, session router, and the
/// caller's session key.
pub struct RunContext {
    orchestrator: Orchestrator<SharedStore, SharedEngine>,
    router: Arc<dyn SessionRouter>,
    session: SessionKey,
    config: PostflowConfig,
    runtime: tokio::runtime::Runtime,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        session: &str,
    ) -> Result<Self, CliError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        }
        .validated()?;

        let (store, router) = open_storage(&config, &workspace_root)?;
        let engine: SharedEngine = match LlmEngine::from_config(&config.engine) {
            Ok(engine) => Arc::new(engine),
            Err(err) => {
                warn!(error = %err, "generation engine unavailable");
                Arc::new(UnavailableEngine {
                    reason: err.to_string(),
                })
            }
        };

        let timeout = config.engine.timeout();
        Ok(Self::from_parts(store, router, engine, session, timeout)?.with_config(config))
    }

    /// Assemble a context from explicit collaborators.
    pub fn from_parts(
        store: SharedStore,
        router: Arc<dyn SessionRouter>,
        engine: SharedEngine,
        session: &str,
        engine_timeout: Option<Duration>,
    ) -> Result<Self, CliError> {
        let session = SessionKey::new(session).ok_or_else(|| {
            WorkflowError::Validation("Session key must not be empty.".to_string())
        })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))?;

        Ok(Self {
            orchestrator: Orchestrator::with_engine_timeout(store, engine, engine_timeout),
            router,
            session,
            config: PostflowConfig::default(),
            runtime,
        })
    }

    /// Configuration reported by `postflow config`.
    pub fn with_config(mut self, config: PostflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator<SharedStore, SharedEngine> {
        &self.orchestrator
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, CliError> {
        match command {
            Commands::Start { topic } => {
                let thread_id = self.orchestrator.start(topic)?;
                self.router.set_active(&self.session, thread_id)?;
                info!(session = %self.session, thread_id = %thread_id, "session switched to new thread");
                let state = self.runtime.block_on(self.orchestrator.generate(thread_id))?;
                Ok(format_review(&state))
            }
            Commands::Show => {
                let Some(thread_id) = self.router.get_active(&self.session)? else {
                    return Ok(RESTART_HINT.to_string());
                };
                match self.orchestrator.status(thread_id) {
                    Ok(status) => Ok(format_status(&status)),
                    Err(WorkflowError::NotFound(_)) => {
                        warn!(session = %self.session, thread_id = %thread_id, "active thread vanished");
                        self.router.clear_active(&self.session)?;
                        Ok(RESTART_HINT.to_string())
                    }
                    Err(err) => Err(err.into()),
                }
            }
            Commands::Approve => {
                let thread_id = self.require_active()?;
                let state = self
                    .runtime
                    .block_on(self.orchestrator.decide(thread_id, Decision::Approve))?;
                Ok(format_published(&state))
            }
            Commands::Revise { feedback } => {
                let thread_id = self.require_active()?;
                let state = self
                    .runtime
                    .block_on(self.orchestrator.decide(thread_id, Decision::revise(feedback.clone())))?;
                Ok(format_review(&state))
            }
            Commands::Retry => {
                let thread_id = self.require_active()?;
                let snapshot = self.orchestrator.get_snapshot(thread_id)?;
                if snapshot.phase != Phase::Generating {
                    return Err(WorkflowError::Precondition(format!(
                        "the post is {}; only a missing draft can be retried",
                        snapshot.phase.as_str()
                    ))
                    .into());
                }
                let state = self.runtime.block_on(self.orchestrator.generate(thread_id))?;
                Ok(format_review(&state))
            }
            Commands::List => {
                let threads = self.orchestrator.threads()?;
                let active = self.router.get_active(&self.session)?;
                let active_state = threads.iter().find(|s| Some(s.thread_id) == active);
                Ok(format_thread_list(&threads, active_state))
            }
            Commands::Use { thread_id } => {
                let parsed: ThreadId = thread_id
                    .parse()
                    .map_err(|_| CliError::InvalidThreadId(thread_id.clone()))?;
                let state = self.orchestrator.get_snapshot(parsed)?;
                self.router.set_active(&self.session, parsed)?;
                Ok(format_snapshot(&state))
            }
            Commands::Config => {
                let mut shown = self.config.clone();
                if shown.engine.api_key.is_some() {
                    shown.engine.api_key = Some("<redacted>".to_string());
                }
                toml::to_string_pretty(&shown)
                    .map_err(|e| CliError::Runtime(format!("Failed to render configuration: {}", e)))
            }
        }
    }

    /// Last known good view of the session's thread, shown next to an error.
    pub fn recovery_view(&self) -> Option<String> {
        let thread_id = self.router.get_active(&self.session).ok()??;
        self.orchestrator
            .get_snapshot(thread_id)
            .ok()
            .map(|state: WorkflowState| format_snapshot(&state))
    }

    fn require_active(&self) -> Result<ThreadId, CliError> {
        self.router
            .get_active(&self.session)?
            .ok_or_else(|| CliError::NoActiveThread(self.session.to_string()))
    }
}

fn open_storage(
    config: &PostflowConfig,
    workspace_root: &Path,
) -> Result<(SharedStore, Arc<dyn SessionRouter>), CliError> {
    match config.storage.backend {
        StorageBackend::Sled => {
            let path = config.storage.resolve_path(workspace_root);
            std::fs::create_dir_all(&path).map_err(|e| {
                CliError::Runtime(format!("Failed to create store directory {:?}: {}", path, e))
            })?;
            let store = SledThreadStore::open(&path)?;
            let router = SledSessionRouter::new(store.db())?;
            Ok((Arc::new(store), Arc::new(router)))
        }
        StorageBackend::Memory => {
            warn!("memory storage selected; posts will not survive this process");
            Ok((
                Arc::new(InMemoryThreadStore::new()),
                Arc::new(InMemorySessionRouter::new()),
            ))
        }
    }
}

/// Stands in for an engine whose configuration could not be built, so
/// read-only commands still work.
struct UnavailableEngine {
    reason: String,
}

#[async_trait]
impl GenerationEngine for UnavailableEngine {
    async fn invoke(&self, _state: &WorkflowState) -> Result<StateDelta, EngineError> {
        Err(EngineError::NotConfigured(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
