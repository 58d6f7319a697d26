// Error types module

use std::path::PathBuf;
use thiserror::Error;

/// Caller-facing error for every pipeline stage.
///
/// Categorizes failures so the web layer can decide what to tell the user:
/// input problems are fixable by the user, fatal upstream errors mean "try
/// again later" or "fix configuration", encoding failures mean the stage
/// must be re-run from the start.
#[derive(Error, Debug)]
pub enum PosterError {
    /// Missing or corrupt source files, rejected prompts
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// The generation API cannot produce an image for this request
    #[error("Upstream unavailable: {0}")]
    FatalUpstream(#[from] FatalUpstreamError),

    /// No output could be written, not even a verbatim copy of the source
    #[error("Failed to write {}: {message}", path.display())]
    Encoding { path: PathBuf, message: String },

    /// Invalid configuration or client construction failure
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scratch or output file handling failed outside the save ladder
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problems the user can correct by changing what they submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid image {}: {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Prompt is too short. Please provide more details (minimum {min} characters, got {len})")]
    PromptTooShort { len: usize, min: usize },

    #[error("Prompt is too long. Please keep it under {max} characters (got {len})")]
    PromptTooLong { len: usize, max: usize },

    #[error("Content contains inappropriate material: {keyword}")]
    ContentPolicy { keyword: String },

    #[error("Unsupported upload '{filename}': only jpg, jpeg and png are accepted")]
    UnsupportedUpload { filename: String },
}

/// Upstream failures that further attempts cannot fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalUpstreamError {
    #[error("API quota exceeded or rate limited: {0}")]
    QuotaExceeded(String),

    #[error("Invalid API credentials: {0}")]
    InvalidCredentials(String),

    #[error("All {attempts} generation attempts failed; last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl PosterError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PosterError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn encoding(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PosterError::Encoding {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        PosterError::Input(InputError::NotFound { path: path.into() })
    }

    pub fn invalid_image(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PosterError::Input(InputError::InvalidImage {
            path: path.into(),
            reason: reason.into(),
        })
    }

    pub fn is_input(&self) -> bool {
        matches!(self, PosterError::Input(_))
    }

    pub fn is_fatal_upstream(&self) -> bool {
        matches!(self, PosterError::FatalUpstream(_))
    }

    /// Message suitable for showing to the person who made the request.
    pub fn user_message(&self) -> String {
        match self {
            PosterError::Input(err) => err.to_string(),
            PosterError::FatalUpstream(FatalUpstreamError::QuotaExceeded(_)) => {
                "The image service is busy right now. Please try again later.".to_string()
            }
            PosterError::FatalUpstream(FatalUpstreamError::InvalidCredentials(_))
            | PosterError::Config(_) => {
                "Image generation is not configured correctly. Please contact support."
                    .to_string()
            }
            PosterError::FatalUpstream(FatalUpstreamError::RetriesExhausted { .. }) => {
                "Error generating poster. Please try again.".to_string()
            }
            PosterError::Encoding { .. } | PosterError::Io { .. } => {
                "Error processing poster. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = PosterError::from(InputError::PromptTooShort { len: 1, min: 10 });
        assert!(err.to_string().starts_with("Invalid input: Prompt is too short"));
        assert!(err.is_input());
        assert!(!err.is_fatal_upstream());
    }

    #[test]
    fn test_content_policy_names_keyword() {
        let err = InputError::ContentPolicy {
            keyword: "violence".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Content contains inappropriate material: violence"
        );
    }

    #[test]
    fn test_fatal_upstream_display() {
        let err = PosterError::from(FatalUpstreamError::RetriesExhausted {
            attempts: 3,
            last_error: "HTTP 500".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Upstream unavailable: All 3 generation attempts failed; last error: HTTP 500"
        );
        assert!(err.is_fatal_upstream());
    }

    #[test]
    fn test_user_message_distinguishes_later_from_configuration() {
        let quota = PosterError::from(FatalUpstreamError::QuotaExceeded("429".to_string()));
        let creds = PosterError::from(FatalUpstreamError::InvalidCredentials("401".to_string()));
        assert!(quota.user_message().contains("try again later"));
        assert!(creds.user_message().contains("not configured"));
    }

    #[test]
    fn test_encoding_error_mentions_path() {
        let err = PosterError::encoding("/tmp/out.jpg", "disk full");
        assert_eq!(err.to_string(), "Failed to write /tmp/out.jpg: disk full");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PosterError>();
    }
}
