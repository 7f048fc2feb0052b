//! Current analysis state
//!
//! `Idle`, `Loading`, `Ready` and `Failed` are mutually exclusive. Every
//! request is tagged with a generation; a reply is applied only while the
//! store is still loading that same generation.

use crate::error::{Result, StoreError};
use crate::history::HistoryLedger;
use crate::persistence::{Committed, PersistenceAdapter};
use crate::types::{AnalysisResult, FileOrigin, HistoryEntry, LastAnalysis, Permission, PermissionStats};
use tracing::{debug, info, warn};

/// Monotonic tag attached to each analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse state of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::Loading => write!(f, "loading"),
            Status::Ready => write!(f, "ready"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    Idle,
    Loading { generation: Generation },
    Ready { result: AnalysisResult, origin: FileOrigin },
    Failed { reason: String },
}

pub struct ResultStore {
    state: SessionState,
    last_generation: u64,
    persistence: PersistenceAdapter,
}

impl ResultStore {
    /// Create an idle store
    pub fn new(persistence: PersistenceAdapter) -> Self {
        Self {
            state: SessionState::Idle,
            last_generation: 0,
            persistence,
        }
    }

    /// Create a store seeded from the persisted last analysis, idle if none
    pub fn restore(persistence: PersistenceAdapter) -> Self {
        let mut store = Self::new(persistence);
        match store.persistence.load_last() {
            Some(snapshot) if snapshot.result.is_consistent() => {
                debug!("Restored last analysis of {}", snapshot.result.identity());
                store.state = SessionState::Ready {
                    result: snapshot.result,
                    origin: snapshot.origin,
                };
            }
            Some(_) => warn!("Ignoring last analysis with inconsistent permission data"),
            None => {}
        }
        store
    }

    /// Enter `Loading` for a new request and return its generation
    pub fn begin(&mut self) -> Generation {
        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        self.state = SessionState::Loading { generation };
        debug!("Analysis {} started", generation);
        generation
    }

    /// Whether a reply tagged `generation` would be applied
    pub fn is_current(&self, generation: Generation) -> bool {
        matches!(self.state, SessionState::Loading { generation: g } if g == generation)
    }

    /// Apply a successful reply.
    ///
    /// Records the result in `history` and saves it as the last analysis.
    /// Returns `None` without side effects when the reply is stale.
    pub fn succeed(
        &mut self,
        generation: Generation,
        result: AnalysisResult,
        origin: FileOrigin,
        history: &mut HistoryLedger,
    ) -> Option<Committed<HistoryEntry>> {
        if !self.is_current(generation) {
            warn!("Discarding stale analysis reply {} for {}", generation, result.identity());
            return None;
        }

        let origin = origin.with_icon_from(&result);
        info!("Analysis {} finished: {}", generation, result.identity());

        let entry = history.upsert(result.clone(), Some(origin.clone()));
        self.state = SessionState::Ready { result, origin };
        let saved = self.save_last();

        Some(match entry.persist_error {
            Some(e) => Committed::new(entry.value, Err(e)),
            None => Committed::new(entry.value, saved),
        })
    }

    /// Apply a failed reply. Returns `false` when the reply is stale.
    pub fn fail(&mut self, generation: Generation, reason: String) -> bool {
        if !self.is_current(generation) {
            warn!("Discarding stale analysis failure {}: {}", generation, reason);
            return false;
        }
        info!("Analysis {} failed: {}", generation, reason);
        self.state = SessionState::Failed { reason };
        true
    }

    /// Return to `Idle` and delete the persisted last analysis
    pub fn clear(&mut self) -> Committed<()> {
        self.state = SessionState::Idle;
        debug!("Cleared current analysis");
        let deleted = self.persistence.delete_last();
        if let Err(ref e) = deleted {
            warn!("Last analysis not deleted: {}", e);
        }
        Committed::new((), deleted)
    }

    /// Display the history entry with generated identifier `id`.
    ///
    /// Fails with `NotFound` and leaves state untouched when absent.
    pub fn load_from_history(&mut self, id: &str, history: &HistoryLedger) -> Result<Committed<AnalysisResult>> {
        let entry = history
            .find(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let result = entry.result.clone();
        self.state = SessionState::Ready {
            result: result.clone(),
            origin: entry.origin_or_synthesized(),
        };
        debug!("Loaded {} from history entry {}", result.identity(), id);

        let saved = self.save_last();
        Ok(Committed::new(result, saved))
    }

    fn save_last(&self) -> Result<()> {
        let SessionState::Ready { result, origin } = &self.state else {
            return Ok(());
        };
        let snapshot = LastAnalysis {
            result: result.clone(),
            origin: origin.clone(),
        };
        let saved = self.persistence.save_last(&snapshot);
        if let Err(ref e) = saved {
            warn!("Last analysis not persisted: {}", e);
        }
        saved
    }

    pub fn status(&self) -> Status {
        match self.state {
            SessionState::Idle => Status::Idle,
            SessionState::Loading { .. } => Status::Loading,
            SessionState::Ready { .. } => Status::Ready,
            SessionState::Failed { .. } => Status::Failed,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading { .. })
    }

    /// Generation currently being loaded
    pub fn pending_generation(&self) -> Option<Generation> {
        match self.state {
            SessionState::Loading { generation } => Some(generation),
            _ => None,
        }
    }

    /// Displayed result, if `Ready`
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Ready { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Origin of the displayed result, if `Ready`
    pub fn origin(&self) -> Option<&FileOrigin> {
        match &self.state {
            SessionState::Ready { origin, .. } => Some(origin),
            _ => None,
        }
    }

    /// Failure reason, if `Failed`
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn has_analysis_result(&self) -> bool {
        self.result().is_some()
    }

    pub fn dangerous_permissions(&self) -> &[Permission] {
        self.result()
            .map(|r| r.dangerous_permissions.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_certificate_expired(&self) -> bool {
        self.result().map(|r| r.is_certificate_expired).unwrap_or(false)
    }

    pub fn formatted_version_info(&self) -> &str {
        self.result()
            .map(|r| r.formatted_version_info.as_str())
            .unwrap_or("")
    }

    pub fn formatted_sdk_info(&self) -> &str {
        self.result()
            .map(|r| r.formatted_sdk_info.as_str())
            .unwrap_or("")
    }

    pub fn permission_stats(&self) -> PermissionStats {
        self.result().map(|r| r.permission_stats).unwrap_or_default()
    }
}
