//! Vision-model analysis of report photos.
//!
//! Fetches the image, runs it through an ordered list of Gemini model
//! variants, and reduces the winning text with the safety heuristic.
//! Persisting the result is the caller's responsibility.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::gemini::GeminiClient;
use crate::db::Store;
use crate::services::safety::{self, SafetyLevel};

const ANALYSIS_PROMPT: &str = "Analyze this infrastructure image for safety assessment. \
Focus on identifying:\n\
1. Road surface conditions (potholes, cracks, erosion)\n\
2. Drainage issues (flooding, standing water, blocked drains)\n\
3. Structural damage (cracks, erosion, instability)\n\
4. Environmental hazards\n\
5. Overall safety level\n\n\
Provide a detailed analysis with specific observations and safety recommendations. \
Be thorough in identifying any potential dangers or safety concerns.";

/// Pause between items of the bulk pass, to stay under external rate limits.
const BULK_ITEM_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    #[error("All model variants failed to analyze the image")]
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis: String,
    pub level: SafetyLevel,
    pub percentage: u8,
    pub model_used: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkAnalysisStats {
    pub analyzed: usize,
    pub failed: usize,
}

pub struct AnalysisService {
    http: Client,
    gemini: Arc<GeminiClient>,
    models: Vec<String>,
    store: Store,
}

impl AnalysisService {
    #[must_use]
    pub const fn new(
        http: Client,
        gemini: Arc<GeminiClient>,
        models: Vec<String>,
        store: Store,
    ) -> Self {
        Self {
            http,
            gemini,
            models,
            store,
        }
    }

    /// Fetch, encode, try each model variant in order; the first success
    /// is scored by the safety heuristic.
    pub async fn analyze(&self, image_url: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let response = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?;

        let encoded = BASE64.encode(&bytes);

        for model in &self.models {
            match self
                .gemini
                .generate_content(model, ANALYSIS_PROMPT, &mime_type, &encoded)
                .await
            {
                Ok(analysis) => {
                    let assessment = safety::assess(&analysis);
                    info!(model = %model, level = %assessment.level, "Image analyzed");
                    return Ok(AnalysisOutcome {
                        analysis,
                        level: assessment.level,
                        percentage: assessment.percentage,
                        model_used: model.clone(),
                    });
                }
                Err(e) => {
                    debug!(model = %model, error = %e, "Model variant failed, trying next");
                }
            }
        }

        Err(AnalysisError::Exhausted)
    }

    /// Analyze every report that has no safety score yet, strictly
    /// sequentially with a fixed pause between items. A single item's
    /// failure is logged and skipped.
    pub async fn analyze_pending(&self) -> anyhow::Result<BulkAnalysisStats> {
        let pending = self.store.list_unanalyzed_reports().await?;
        let mut stats = BulkAnalysisStats::default();

        info!(count = pending.len(), "Starting bulk analysis pass");

        for report in pending {
            match self.analyze(&report.image_url).await {
                Ok(outcome) => {
                    let attach = self
                        .store
                        .attach_analysis(
                            report.id,
                            &outcome.analysis,
                            outcome.level.as_str(),
                            i32::from(outcome.percentage),
                        )
                        .await;

                    match attach {
                        Ok(Some(_)) => stats.analyzed += 1,
                        Ok(None) => {
                            warn!(report_id = report.id, "Report vanished during bulk analysis");
                            stats.failed += 1;
                        }
                        Err(e) => {
                            warn!(report_id = report.id, error = %e, "Failed to persist analysis");
                            stats.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(report_id = report.id, error = %e, "Analysis failed, skipping");
                    stats.failed += 1;
                }
            }

            tokio::time::sleep(BULK_ITEM_DELAY).await;
        }

        info!(
            analyzed = stats.analyzed,
            failed = stats.failed,
            "Bulk analysis pass finished"
        );

        Ok(stats)
    }
}
