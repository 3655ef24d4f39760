//! Submission lifecycle: select a photo, analyze it, show or share the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{GatewayError, ShareError, SubmitError, ValidationError};
use crate::gateway::InferenceGateway;
use crate::parser::{self, ParsedResult};
use crate::share::{ShareFailure, ShareMessage, ShareOutcome, SharePlatform};
use crate::submission::ImageSubmission;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Previewing,
    Loading,
    Succeeded(ParsedResult),
    Failed(String),
}

/// Handed out by [`UploadController::begin_submit`]; pass it back to `complete`.
///
/// Dropping it without completing frees the controller for the next submit.
#[derive(Debug)]
pub struct PendingInference {
    id: u64,
    image: ImageSubmission,
    in_flight: Arc<AtomicU64>,
}

impl PendingInference {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn image(&self) -> &ImageSubmission {
        &self.image
    }
}

impl Drop for PendingInference {
    fn drop(&mut self) {
        let _ = self
            .in_flight
            .compare_exchange(self.id, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

#[derive(Debug)]
pub struct UploadController {
    state: SubmissionState,
    selected: Option<ImageSubmission>,
    validation_error: Option<ValidationError>,
    // Id of the submission awaiting the gateway, 0 when none.
    in_flight: Arc<AtomicU64>,
    // Bumped on every selection and submit; completions carrying an older id are stale.
    generation: u64,
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadController {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            selected: None,
            validation_error: None,
            in_flight: Arc::new(AtomicU64::new(0)),
            generation: 0,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Built on demand so callers that never render it don't pay for the encoding.
    pub fn preview(&self) -> Option<String> {
        self.selected.as_ref().map(ImageSubmission::preview_url)
    }

    pub fn selected(&self) -> Option<&ImageSubmission> {
        self.selected.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SubmissionState::Loading)
    }

    /// Mirrors the submit button: a photo is chosen and nothing is in flight.
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.is_busy()
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    /// The message to show inline, if any.
    pub fn error_message(&self) -> Option<String> {
        if let Some(err) = &self.validation_error {
            return Some(err.user_message());
        }
        match &self.state {
            SubmissionState::Failed(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ParsedResult> {
        match &self.state {
            SubmissionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn select_file(&mut self, image: ImageSubmission) {
        debug!(
            media_type = image.media_type(),
            bytes = image.len(),
            "Photo selected"
        );
        self.selected = Some(image);
        self.validation_error = None;
        self.generation += 1;
        self.state = SubmissionState::Previewing;
    }

    pub fn begin_submit(&mut self) -> Result<PendingInference, SubmitError> {
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }

        let checked = match self.selected.as_ref() {
            None => Err(ValidationError::NoFile),
            Some(image) if image.is_empty() => Err(ValidationError::EmptyFile),
            Some(image) => Ok(image.clone()),
        };
        let image = checked.map_err(|err| self.reject(err))?;

        self.generation += 1;
        self.in_flight.store(self.generation, Ordering::Release);
        self.validation_error = None;
        self.state = SubmissionState::Loading;

        Ok(PendingInference {
            id: self.generation,
            image,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Applies the gateway outcome. Returns `false` if a newer selection superseded it.
    pub fn complete(
        &mut self,
        pending: PendingInference,
        outcome: Result<String, GatewayError>,
    ) -> bool {
        let _ = self.in_flight.compare_exchange(
            pending.id,
            0,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        if pending.id != self.generation || !self.is_loading() {
            debug!(id = pending.id, "Discarding result of superseded submission");
            return false;
        }

        self.state = match outcome {
            Ok(text) => {
                let result = parser::parse(&text);
                info!(
                    matched = result.subject_name.is_some(),
                    "Analysis finished"
                );
                SubmissionState::Succeeded(result)
            }
            Err(err) => {
                warn!("Analysis failed: {err}");
                SubmissionState::Failed(err.user_message())
            }
        };
        true
    }

    /// Runs one submission to completion against `gateway`.
    pub async fn submit(&mut self, gateway: &dyn InferenceGateway) -> Result<(), SubmitError> {
        let pending = self.begin_submit()?;
        let outcome = gateway.infer(pending.image()).await;
        self.complete(pending, outcome);
        Ok(())
    }

    /// Shares the current result; falls back to the clipboard. Cancelling is not an error.
    pub async fn share(
        &self,
        platform: &dyn SharePlatform,
        page_url: &str,
    ) -> Result<ShareOutcome, ShareError> {
        let payload = self
            .result()
            .and_then(ShareMessage::compose)
            .ok_or(ShareError::NothingToShare)?
            .with_url(page_url);

        let delivered = if platform.supports_native_share() {
            platform.share(&payload).await.map(|_| ShareOutcome::Shared)
        } else {
            platform
                .copy_to_clipboard(&payload.clipboard_text())
                .await
                .map(|_| ShareOutcome::Copied)
        };

        match delivered {
            Ok(outcome) => Ok(outcome),
            Err(ShareFailure::Cancelled) => {
                debug!("Share dismissed");
                Ok(ShareOutcome::Dismissed)
            }
            Err(ShareFailure::Failed(reason)) => Err(ShareError::Failed(reason)),
        }
    }

    fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) != 0
    }

    fn reject(&mut self, err: ValidationError) -> SubmitError {
        debug!("Submit rejected: {err}");
        self.validation_error = Some(err.clone());
        SubmitError::Validation(err)
    }
}
