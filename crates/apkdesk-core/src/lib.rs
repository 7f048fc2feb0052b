//! apkdesk core library
//!
//! State layer between the external package analysis engine and the UI:
//! decides when to invoke the engine, keeps the current result, maintains a
//! bounded and deduplicated history, and persists both across restarts.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod persistence;
pub mod report;
pub mod store;
pub mod types;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use gateway::{AnalyzerGateway, CommandGateway};
pub use history::HistoryLedger;
pub use persistence::{Committed, PersistenceAdapter};
pub use store::{Generation, ResultStore, Status};
pub use types::*;

use std::sync::Arc;
use tracing::{debug, info};

/// An analysis request that has entered `Loading` but not yet run
#[derive(Debug)]
pub struct PendingAnalysis {
    generation: Generation,
    input: AnalysisInput,
    origin: FileOrigin,
}

impl PendingAnalysis {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn input(&self) -> &AnalysisInput {
        &self.input
    }

    /// Call the engine. This is the only suspension point of a request.
    pub async fn execute(self, gateway: &dyn AnalyzerGateway) -> FinishedAnalysis {
        let outcome = gateway.analyze(&self.input).await;
        FinishedAnalysis {
            generation: self.generation,
            origin: self.origin,
            outcome,
        }
    }
}

/// Engine reply for a request, not yet applied to the session
#[derive(Debug)]
pub struct FinishedAnalysis {
    generation: Generation,
    origin: FileOrigin,
    outcome: Result<AnalysisResult>,
}

impl FinishedAnalysis {
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// What applying a reply did to the session
#[derive(Debug)]
pub enum Completion {
    /// The result is displayed and recorded in history
    Applied(Committed<HistoryEntry>),
    /// The session moved to `Failed` with this reason
    Failed(String),
    /// A newer request or action superseded this reply; nothing changed
    Discarded(Generation),
}

/// The analysis session behind the UI.
///
/// Construct one per process and keep it for the process lifetime. Creation
/// seeds history and the current result from persistence.
pub struct Session {
    gateway: Arc<dyn AnalyzerGateway>,
    results: ResultStore,
    history: HistoryLedger,
}

impl Session {
    /// Create a session over `gateway` and `persistence`
    pub fn new(
        gateway: Arc<dyn AnalyzerGateway>,
        persistence: PersistenceAdapter,
        history_capacity: usize,
    ) -> Self {
        let history = HistoryLedger::restore(persistence.clone(), history_capacity);
        let results = ResultStore::restore(persistence);
        debug!(
            "Session ready via {} gateway: {} history entries, status {}",
            gateway.name(),
            history.len(),
            results.status()
        );
        Self {
            gateway,
            results,
            history,
        }
    }

    /// Create a session with the command gateway and storage described by `config`
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let persistence = PersistenceAdapter::from_config(&config.storage)?;
        let gateway = Arc::new(CommandGateway::from_config(&config.analyzer));
        Ok(Self::new(gateway, persistence, config.history_capacity))
    }

    /// Analyze `input` and wait for the engine.
    ///
    /// On success the result is displayed, recorded in history and saved as
    /// the last analysis. Engine failures move the session to `Failed` and
    /// are returned as `AnalysisFailure`.
    pub async fn analyze(&mut self, input: AnalysisInput) -> Result<Committed<HistoryEntry>> {
        let pending = self.begin_analysis(input);
        let gateway = Arc::clone(&self.gateway);
        let finished = pending.execute(gateway.as_ref()).await;

        match self.complete_analysis(finished) {
            Completion::Applied(entry) => Ok(entry),
            Completion::Failed(reason) => Err(StoreError::AnalysisFailure(reason)),
            Completion::Discarded(generation) => Err(StoreError::Superseded(generation.value())),
        }
    }

    /// Enter `Loading` for `input` without calling the engine yet
    pub fn begin_analysis(&mut self, input: AnalysisInput) -> PendingAnalysis {
        let origin = input.origin();
        let generation = self.results.begin();
        info!("Analyzing {} (request {})", input.display_name(), generation);
        PendingAnalysis {
            generation,
            input,
            origin,
        }
    }

    /// Apply an engine reply, discarding it if it is no longer expected
    pub fn complete_analysis(&mut self, finished: FinishedAnalysis) -> Completion {
        let FinishedAnalysis {
            generation,
            origin,
            outcome,
        } = finished;

        match outcome {
            Ok(result) => match self
                .results
                .succeed(generation, result, origin, &mut self.history)
            {
                Some(entry) => Completion::Applied(entry),
                None => Completion::Discarded(generation),
            },
            Err(e) => {
                let reason = match e {
                    StoreError::AnalysisFailure(reason) => reason,
                    other => other.to_string(),
                };
                if self.results.fail(generation, reason.clone()) {
                    Completion::Failed(reason)
                } else {
                    Completion::Discarded(generation)
                }
            }
        }
    }

    /// Display a history entry. `NotFound` leaves the session unchanged.
    pub fn load_from_history(&mut self, id: &str) -> Result<Committed<AnalysisResult>> {
        self.results.load_from_history(id, &self.history)
    }

    pub fn remove_from_history(&mut self, id: &str) -> Committed<bool> {
        self.history.remove(id)
    }

    pub fn clear_history(&mut self) -> Committed<()> {
        self.history.clear()
    }

    /// Return to `Idle` and delete the persisted last analysis
    pub fn clear_current_analysis(&mut self) -> Committed<()> {
        self.results.clear()
    }

    pub fn gateway(&self) -> Arc<dyn AnalyzerGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn status(&self) -> Status {
        self.results.status()
    }

    pub fn is_loading(&self) -> bool {
        self.results.is_loading()
    }

    pub fn current(&self) -> Option<&AnalysisResult> {
        self.results.result()
    }

    pub fn current_origin(&self) -> Option<&FileOrigin> {
        self.results.origin()
    }

    pub fn error(&self) -> Option<&str> {
        self.results.error()
    }

    pub fn has_analysis_result(&self) -> bool {
        self.results.has_analysis_result()
    }

    pub fn dangerous_permissions(&self) -> &[Permission] {
        self.results.dangerous_permissions()
    }

    pub fn is_certificate_expired(&self) -> bool {
        self.results.is_certificate_expired()
    }

    pub fn formatted_version_info(&self) -> &str {
        self.results.formatted_version_info()
    }

    pub fn formatted_sdk_info(&self) -> &str {
        self.results.formatted_sdk_info()
    }

    pub fn permission_stats(&self) -> PermissionStats {
        self.results.permission_stats()
    }

    /// History entries, newest first
    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn find_history(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.find(id)
    }

    /// Report source for the displayed result
    pub fn current_report(&self) -> Option<report::ReportSource> {
        self.current().map(|result| report::ReportSource::Analysis {
            result: result.clone(),
            origin: self.current_origin().cloned(),
        })
    }
}
