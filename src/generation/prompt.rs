//! Prompt validation and enhancement.

use crate::constants::{MAX_PROMPT_CHARS, MIN_PROMPT_CHARS};
use crate::error::InputError;

/// Keywords that reject a prompt (case-insensitive substring match).
pub const BLOCKED_KEYWORDS: &[&str] = &[
    "violence",
    "explicit",
    "nsfw",
    "adult",
    "inappropriate",
    "harmful",
    "offensive",
    "hate",
    "discriminatory",
];

/// Validate a user prompt and return it trimmed.
///
/// Lengths are counted in characters of the trimmed prompt.
pub fn validate_prompt(prompt: &str) -> Result<String, InputError> {
    let trimmed = prompt.trim();
    let len = trimmed.chars().count();

    if len == 0 {
        return Err(InputError::EmptyPrompt);
    }
    if len < MIN_PROMPT_CHARS {
        return Err(InputError::PromptTooShort {
            len,
            min: MIN_PROMPT_CHARS,
        });
    }
    if len > MAX_PROMPT_CHARS {
        return Err(InputError::PromptTooLong {
            len,
            max: MAX_PROMPT_CHARS,
        });
    }

    let lower = trimmed.to_lowercase();
    if let Some(keyword) = BLOCKED_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        return Err(InputError::ContentPolicy {
            keyword: keyword.to_string(),
        });
    }

    Ok(trimmed.to_string())
}

/// Wrap a validated prompt in the poster style instructions sent upstream.
pub fn enhance_prompt(prompt: &str) -> String {
    format!(
        "Create a professional, eye-catching poster with the following requirements:\n\
         \n\
         Content: {}\n\
         \n\
         Style guidelines:\n\
         - High-resolution, print-quality design (at least 1024x1024)\n\
         - Professional typography and layout\n\
         - Balanced composition with clear visual hierarchy\n\
         - Vibrant but tasteful color scheme\n\
         - Main content should be centered and leave space at top and bottom for text overlays\n\
         - Clean, modern aesthetic suitable for business use\n\
         - Avoid cluttered designs or excessive text\n\
         - Include visual elements that complement the content theme\n\
         - Suitable for both digital and print media\n\
         - Professional business poster style\n\
         - Design should work well with header and footer text overlays\n\
         - Main visual content should be in the center 2/3 of the image",
        prompt.trim()
    )
}
