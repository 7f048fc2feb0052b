//! Boundary to the external package analysis engine
//!
//! One request, one response or one failure. Gateways never retry, never
//! touch history or persistence.

mod command;

pub use command::{CommandGateway, ANALYZE_COMMAND};

use crate::error::Result;
use crate::types::{AnalysisInput, AnalysisResult};
use async_trait::async_trait;

/// Trait for analyzer engine gateways
#[async_trait]
pub trait AnalyzerGateway: Send + Sync {
    /// Analyze one package.
    ///
    /// Any engine-reported error or transport fault is returned as
    /// `StoreError::AnalysisFailure` carrying a human-readable reason.
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult>;

    /// Get the gateway name
    fn name(&self) -> &str;
}
