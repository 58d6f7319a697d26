// Pipeline driver - generation, profile overlay and watermark in sequence

use crate::compositor::{
    add_profile_overlay, Degradation, ProfileData, ProfileField, WatermarkCompositor,
    WatermarkKind,
};
use crate::config::Config;
use crate::error::PosterError;
use crate::fonts::FontResolver;
use crate::generation::{GeminiClient, GenerationOrchestrator, GenerationRequest, ImageGenerator};
use crate::storage::{generate_filename, StorageLayout};
use std::path::{Path, PathBuf};

/// One user-initiated poster generation.
#[derive(Debug, Clone, Default)]
pub struct PosterRequest {
    pub prompt: String,
    /// Profile to overlay; `None` skips the overlay stage
    pub profile: Option<ProfileData>,
    pub selected: Vec<ProfileField>,
    pub unlimited_access: bool,
}

impl PosterRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: ProfileData, selected: Vec<ProfileField>) -> Self {
        self.profile = Some(profile);
        self.selected = selected;
        self
    }

    pub fn with_unlimited_access(mut self, unlimited: bool) -> Self {
        self.unlimited_access = unlimited;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterOutcome {
    /// Final poster under the posters directory
    pub path: PathBuf,
    /// Name to record with the poster; may differ in extension after a lossless fallback
    pub filename: String,
    pub watermark: WatermarkKind,
    pub generation_attempts: u32,
    pub degradations: Vec<Degradation>,
}

/// Removes a scratch file when dropped, whether or not it was ever created.
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => tracing::debug!(path = %self.0.display(), "Scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.0.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}

pub struct PosterPipeline<G> {
    orchestrator: GenerationOrchestrator<G>,
    storage: StorageLayout,
    fonts: FontResolver,
    watermark: WatermarkCompositor,
}

impl PosterPipeline<GeminiClient> {
    /// Wire the pipeline against the real generation API.
    pub fn from_config(config: &Config) -> Result<Self, PosterError> {
        let client = GeminiClient::from_config(&config.generation)?;
        let orchestrator = GenerationOrchestrator::new(
            client,
            config.generation.retry.to_retry_policy(),
            config.generation.limits(),
        );
        Ok(Self::new(
            orchestrator,
            StorageLayout::from_config(&config.storage),
            FontResolver::new(config.fonts.clone()),
            WatermarkCompositor::new(config.watermark.clone()),
        ))
    }
}

impl<G: ImageGenerator> PosterPipeline<G> {
    pub fn new(
        orchestrator: GenerationOrchestrator<G>,
        storage: StorageLayout,
        fonts: FontResolver,
        watermark: WatermarkCompositor,
    ) -> Self {
        Self {
            orchestrator,
            storage,
            fonts,
            watermark,
        }
    }

    pub fn storage(&self) -> &StorageLayout {
        &self.storage
    }

    /// Generate, overlay and watermark one poster.
    ///
    /// Scratch files are removed on every exit path. A failed profile overlay
    /// degrades to the raw generated image; only generation errors and a
    /// watermark stage that could not write anything are hard failures.
    pub fn run(&self, request: &PosterRequest) -> Result<PosterOutcome, PosterError> {
        let filename = generate_filename("jpg");
        let raw = ScratchFile(self.storage.scratch_path("temp", &filename));
        let overlay = ScratchFile(self.storage.scratch_path("overlay", &filename));
        let mut degradations = Vec::new();

        let generated = self
            .orchestrator
            .generate(&GenerationRequest::new(&request.prompt, raw.path()))?;

        let source = match &request.profile {
            Some(profile) => {
                match add_profile_overlay(
                    raw.path(),
                    overlay.path(),
                    profile,
                    &request.selected,
                    &self.storage,
                    &self.fonts,
                ) {
                    Ok(report) => {
                        degradations.extend(report.degradations);
                        overlay.path()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Profile overlay failed, using generated image");
                        degradations.push(Degradation::OverlaySkipped {
                            reason: e.to_string(),
                        });
                        raw.path()
                    }
                }
            }
            None => raw.path(),
        };

        let destination = self.storage.poster_path(&filename);
        let marked = self.watermark.apply(
            source,
            &destination,
            request.unlimited_access,
            &self.fonts,
        )?;

        if matches!(marked.kind, WatermarkKind::Lossless | WatermarkKind::SourceCopy) {
            degradations.push(Degradation::WatermarkFallback {
                kind: marked.kind,
                failures: marked.failures.clone(),
            });
        }

        let filename = marked
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or(filename);

        tracing::info!(
            path = %marked.path.display(),
            watermark = %marked.kind,
            attempts = generated.attempts,
            degradations = degradations.len(),
            "Poster created"
        );

        Ok(PosterOutcome {
            path: marked.path,
            filename,
            watermark: marked.kind,
            generation_attempts: generated.attempts,
            degradations,
        })
    }
}
