//! Mutable per-run progress, consulted by the caller after the run.

use serde::Serialize;

use stockbook_core::EnrichmentMode;

use crate::error::EnrichError;
use crate::step::{can_transition, Step};

/// Progress of one orchestration run. `completed_steps` survives a failure
/// so the caller can see how far the run got.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentProgress {
    pub mode: EnrichmentMode,
    pub step: Step,
    pub completed_steps: Vec<Step>,
    pub metas_count: Option<usize>,
    pub images_count: Option<usize>,
    /// Which step failed, when `step` is `Error`.
    pub failed_step: Option<Step>,
    pub message: Option<String>,
}

impl EnrichmentProgress {
    #[must_use]
    pub fn new(mode: EnrichmentMode) -> Self {
        Self {
            mode,
            step: Step::Idle,
            completed_steps: Vec::new(),
            metas_count: None,
            images_count: None,
            failed_step: None,
            message: None,
        }
    }

    /// Moves to `to`, recording the step being left as completed.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::IllegalTransition`] when the step table
    /// forbids the move.
    pub fn advance(&mut self, to: Step) -> Result<(), EnrichError> {
        if !can_transition(self.step, to) {
            return Err(EnrichError::IllegalTransition {
                from: self.step,
                to,
            });
        }
        if self.step != Step::Idle {
            self.completed_steps.push(self.step);
        }
        tracing::info!(step = %to, "step started");
        self.step = to;
        Ok(())
    }

    /// Marks the run failed at the current step. The failing step is not
    /// added to `completed_steps`.
    pub fn fail(&mut self, message: String) {
        tracing::warn!(step = %self.step, message, "step failed");
        self.failed_step = Some(self.step);
        self.message = Some(message);
        self.step = Step::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_steps_accumulate_in_order() {
        let mut progress = EnrichmentProgress::new(EnrichmentMode::Images);
        progress.advance(Step::FindingUrl).expect("legal");
        progress.advance(Step::ScrapingPage).expect("legal");
        progress.advance(Step::DownloadingImages).expect("legal");
        assert_eq!(
            progress.completed_steps,
            vec![Step::FindingUrl, Step::ScrapingPage]
        );
        assert_eq!(progress.step, Step::DownloadingImages);
    }

    #[test]
    fn failure_preserves_completed_steps_and_failing_step_identity() {
        let mut progress = EnrichmentProgress::new(EnrichmentMode::Images);
        progress.advance(Step::FindingUrl).expect("legal");
        progress.advance(Step::ScrapingPage).expect("legal");
        progress.fail("navigation timed out after 45s".to_string());

        assert_eq!(progress.step, Step::Error);
        assert_eq!(progress.failed_step, Some(Step::ScrapingPage));
        assert_eq!(progress.completed_steps, vec![Step::FindingUrl]);
        assert_eq!(
            progress.message.as_deref(),
            Some("navigation timed out after 45s")
        );
    }

    #[test]
    fn illegal_advance_is_rejected() {
        let mut progress = EnrichmentProgress::new(EnrichmentMode::Metas);
        let result = progress.advance(Step::DownloadingImages);
        assert!(matches!(
            result,
            Err(EnrichError::IllegalTransition {
                from: Step::Idle,
                to: Step::DownloadingImages
            })
        ));
        // A rejected transition leaves the progress untouched.
        assert_eq!(progress.step, Step::Idle);
        assert!(progress.completed_steps.is_empty());
    }
}
