//! Generation orchestrator.
//!
//! Each request moves through `Validating -> Calling -> (Succeeded |
//! RetryableFailure -> Calling | FatalFailure)`. Prompt problems are rejected
//! before any upstream call. Retryable failures are retried with exponential
//! backoff until the policy's attempt budget is spent; quota and credential
//! failures stop immediately.
//!
//! Returned image bytes are written to a temporary file next to the output,
//! decoded to check their dimensions, and only then renamed onto the output
//! path, so the output path never holds a partial or invalid image.

pub mod client;
pub mod error;
pub mod prompt;

pub use client::{Candidate, GeminiClient, GenerationResponse, ImageGenerator, Part};
pub use error::{UpstreamError, UpstreamErrorKind};
pub use prompt::{enhance_prompt, validate_prompt, BLOCKED_KEYWORDS};

use crate::constants::{DEFAULT_MIN_IMAGE_BYTES, DEFAULT_MIN_IMAGE_DIMENSION};
use crate::error::{FatalUpstreamError, PosterError};
use crate::raster;
use crate::retry::RetryPolicy;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Thresholds a returned image must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationLimits {
    pub min_image_bytes: usize,
    pub min_image_dimension: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
            min_image_dimension: DEFAULT_MIN_IMAGE_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub output_path: PathBuf,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            output_path: output_path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Upstream calls made, including the successful one
    pub attempts: u32,
}

/// Why a single attempt failed.
enum AttemptFailure {
    Upstream(UpstreamError),
    /// Local filesystem problem; not an upstream condition
    Storage(PosterError),
}

impl From<UpstreamError> for AttemptFailure {
    fn from(err: UpstreamError) -> Self {
        AttemptFailure::Upstream(err)
    }
}

/// Drives an [`ImageGenerator`] with validation, retries and atomic persistence.
pub struct GenerationOrchestrator<G> {
    generator: G,
    policy: RetryPolicy,
    limits: GenerationLimits,
}

impl<G: ImageGenerator> GenerationOrchestrator<G> {
    pub fn new(generator: G, policy: RetryPolicy, limits: GenerationLimits) -> Self {
        Self {
            generator,
            policy,
            limits,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate an image for `request.prompt` and store it at `request.output_path`.
    ///
    /// # Errors
    ///
    /// - `PosterError::Input` for a rejected prompt (no upstream call made)
    /// - `PosterError::FatalUpstream` for quota, credential or exhausted-retry failures
    /// - `PosterError::Io` when the image cannot be written locally
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, PosterError> {
        let prompt = validate_prompt(&request.prompt)?;
        let enhanced = enhance_prompt(&prompt);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.policy.backoff_duration(attempt);
                tracing::info!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying image generation"
                );
                std::thread::sleep(delay);
            }

            tracing::info!(
                attempt = attempt + 1,
                max_attempts,
                "Calling image generation API"
            );

            match self.attempt(&enhanced, &request.output_path) {
                Ok((width, height)) => {
                    tracing::info!(
                        path = %request.output_path.display(),
                        width,
                        height,
                        attempts = attempt + 1,
                        "Generated image saved"
                    );
                    return Ok(GenerationResult {
                        path: request.output_path.clone(),
                        width,
                        height,
                        attempts: attempt + 1,
                    });
                }
                Err(AttemptFailure::Storage(err)) => {
                    tracing::error!(error = %err, "Could not store generated image");
                    return Err(err);
                }
                Err(AttemptFailure::Upstream(err)) => {
                    let message = err.to_string();
                    if let Some(fatal) = err.into_fatal() {
                        tracing::error!(
                            attempt = attempt + 1,
                            error = %message,
                            "Generation failed with a non-retryable error"
                        );
                        return Err(fatal.into());
                    }
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %message,
                        "Generation attempt failed"
                    );
                    last_error = message;
                    if !self.policy.should_retry(attempt, true) {
                        break;
                    }
                }
            }
        }

        tracing::error!(attempts = max_attempts, error = %last_error, "All generation attempts failed");
        Err(FatalUpstreamError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        }
        .into())
    }

    fn attempt(&self, prompt: &str, output: &Path) -> Result<(u32, u32), AttemptFailure> {
        let response = self.generator.generate(prompt)?;

        if response.candidates.is_empty() {
            return Err(UpstreamError::malformed("No candidates returned").into());
        }
        if response.first_parts().is_empty() {
            return Err(UpstreamError::malformed("No content parts in response").into());
        }

        for text in response.texts() {
            let preview: String = text.chars().take(100).collect();
            tracing::debug!(text = %preview, "Generation response text");
        }

        let mut rejected = Vec::new();
        for data in response.images() {
            if data.len() < self.limits.min_image_bytes {
                rejected.push(format!(
                    "image payload of {} bytes is below the {} byte minimum",
                    data.len(),
                    self.limits.min_image_bytes
                ));
                continue;
            }
            match self.store_validated(data, output) {
                Ok(dimensions) => return Ok(dimensions),
                Err(AttemptFailure::Upstream(err)) => rejected.push(err.message),
                Err(storage) => return Err(storage),
            }
        }

        let message = if rejected.is_empty() {
            "No image data in response".to_string()
        } else {
            rejected.join("; ")
        };
        Err(UpstreamError::malformed(message).into())
    }

    /// Write `data` beside `output`, check it decodes at the minimum size, then rename.
    fn store_validated(&self, data: &[u8], output: &Path) -> Result<(u32, u32), AttemptFailure> {
        let storage = |e: std::io::Error| AttemptFailure::Storage(PosterError::io(output, e));

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(storage)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(storage)?;
        tmp.write_all(data).map_err(storage)?;
        tmp.as_file().sync_all().map_err(storage)?;

        // Dropping `tmp` on any early return deletes it
        let image = raster::load(tmp.path())
            .map_err(|e| UpstreamError::malformed(format!("Image validation failed: {}", e)))?;
        let (width, height) = (image.width(), image.height());
        let min = self.limits.min_image_dimension;
        if width < min || height < min {
            return Err(UpstreamError::malformed(format!(
                "Generated image too small: {}x{} (minimum {}x{})",
                width, height, min, min
            ))
            .into());
        }

        tmp.persist(output).map_err(|e| storage(e.error))?;
        Ok((width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::cell::RefCell;
    use std::io::Cursor;

    /// Replays scripted results and records how often it was called.
    struct Scripted {
        responses: RefCell<Vec<Result<GenerationResponse, UpstreamError>>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<GenerationResponse, UpstreamError>>) -> Self {
            responses.reverse();
            Self {
                responses: RefCell::new(responses),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl ImageGenerator for Scripted {
        fn generate(&self, _prompt: &str) -> Result<GenerationResponse, UpstreamError> {
            *self.calls.borrow_mut() += 1;
            self.responses
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(UpstreamError::server(500, "script exhausted")))
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        // Noise keeps the PNG above the minimum payload size
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 + y * 13) as u8, (x * y) as u8, (x ^ y) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, 1, 4)
    }

    const PROMPT: &str = "A bright summer sale poster";

    #[test]
    fn test_success_on_first_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let generator = Scripted::new(vec![Ok(GenerationResponse::with_image(
            "image/png",
            png_bytes(128, 128),
        ))]);
        let orchestrator =
            GenerationOrchestrator::new(&generator, fast_policy(), GenerationLimits::default());

        let result = orchestrator
            .generate(&GenerationRequest::new(PROMPT, &output))
            .unwrap();

        assert_eq!(result.attempts, 1);
        assert_eq!((result.width, result.height), (128, 128));
        assert!(output.exists());
        // Only the output remains; the temporary file was renamed
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_short_prompt_makes_no_call() {
        let generator = Scripted::new(vec![]);
        let orchestrator =
            GenerationOrchestrator::new(&generator, fast_policy(), GenerationLimits::default());
        let err = orchestrator
            .generate(&GenerationRequest::new("x", "/tmp/never.png"))
            .unwrap_err();
        assert!(err.is_input());
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_quota_error_is_not_retried() {
        let generator = Scripted::new(vec![Err(UpstreamError::quota("429"))]);
        let orchestrator =
            GenerationOrchestrator::new(&generator, fast_policy(), GenerationLimits::default());
        let err = orchestrator
            .generate(&GenerationRequest::new(PROMPT, "/tmp/never.png"))
            .unwrap_err();
        assert!(matches!(
            err,
            PosterError::FatalUpstream(FatalUpstreamError::QuotaExceeded(_))
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn test_exhausted_retries_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let generator = Scripted::new(vec![
            Err(UpstreamError::server(500, "INTERNAL")),
            Err(UpstreamError::network("reset")),
            Ok(GenerationResponse::default()),
            Ok(GenerationResponse::with_image("image/png", png_bytes(128, 128))),
        ]);
        let orchestrator =
            GenerationOrchestrator::new(&generator, fast_policy(), GenerationLimits::default());

        let err = orchestrator
            .generate(&GenerationRequest::new(PROMPT, &output))
            .unwrap_err();
        match err {
            PosterError::FatalUpstream(FatalUpstreamError::RetriesExhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("No candidates"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(generator.calls(), 3);
        assert!(!output.exists());
    }

    #[test]
    fn test_small_payload_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let generator = Scripted::new(vec![
            Ok(GenerationResponse::with_image("image/png", vec![0u8; 10])),
            Ok(GenerationResponse::with_image("image/png", png_bytes(150, 120))),
        ]);
        let orchestrator =
            GenerationOrchestrator::new(&generator, fast_policy(), GenerationLimits::default());

        let result = orchestrator
            .generate(&GenerationRequest::new(PROMPT, &output))
            .unwrap();
        assert_eq!(result.attempts, 2);
    }

    #[test]
    fn test_undersized_image_never_reaches_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let limits = GenerationLimits {
            min_image_bytes: 10,
            min_image_dimension: 100,
        };
        let generator = Scripted::new(vec![
            Ok(GenerationResponse::with_image("image/png", png_bytes(99, 200))),
            Ok(GenerationResponse::with_image("image/png", png_bytes(99, 200))),
            Ok(GenerationResponse::with_image("image/png", png_bytes(99, 200))),
        ]);
        let orchestrator = GenerationOrchestrator::new(&generator, fast_policy(), limits);

        let err = orchestrator
            .generate(&GenerationRequest::new(PROMPT, &output))
            .unwrap_err();
        assert!(err.is_fatal_upstream());
        assert!(!output.exists());
        // No temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_garbage_payload_is_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let generator = Scripted::new(vec![
            Ok(GenerationResponse::with_image("image/png", vec![7u8; 5000])),
            Ok(GenerationResponse::with_image("image/png", png_bytes(100, 100))),
        ]);
        let orchestrator =
            GenerationOrchestrator::new(&generator, fast_policy(), GenerationLimits::default());
        let result = orchestrator
            .generate(&GenerationRequest::new(PROMPT, &output))
            .unwrap();
        assert_eq!(result.attempts, 2);
    }
}
