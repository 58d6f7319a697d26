// Generation orchestrator against scripted upstream behaviour

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use postasy::error::{FatalUpstreamError, InputError, PosterError};
use postasy::generation::{
    GenerationLimits, GenerationOrchestrator, GenerationRequest, GenerationResponse,
    ImageGenerator, UpstreamError,
};
use postasy::retry::RetryPolicy;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fake generator returning queued results and recording call times.
struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<GenerationResponse, UpstreamError>>>,
    calls: Mutex<Vec<Instant>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(script: Vec<Result<GenerationResponse, UpstreamError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<GenerationResponse, UpstreamError> {
        self.calls.lock().unwrap().push(Instant::now());
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::server(500, "no more scripted responses")))
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 11) as u8, (y * 3) as u8, (x * y) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

const PROMPT: &str = "Grand opening of a neighbourhood coffee shop";

#[test]
fn test_two_retryable_failures_then_success() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("poster.png");
    let generator = ScriptedGenerator::new(vec![
        Err(UpstreamError::server(500, "INTERNAL")),
        Err(UpstreamError::network("connection reset by peer")),
        Ok(GenerationResponse::with_image("image/png", png(160, 120))),
    ]);
    let policy = RetryPolicy::new(3, 40, 1000);
    let orchestrator =
        GenerationOrchestrator::new(&generator, policy, GenerationLimits::default());

    let result = orchestrator
        .generate(&GenerationRequest::new(PROMPT, &output))
        .unwrap();

    assert_eq!(result.attempts, 3);
    assert_eq!((result.width, result.height), (160, 120));
    let saved = image::open(&output).unwrap();
    assert!(saved.width() >= 100 && saved.height() >= 100);

    // 40ms before the second call, 80ms before the third
    let times = generator.call_times();
    assert_eq!(times.len(), 3);
    assert!(times[1] - times[0] >= Duration::from_millis(40));
    assert!(times[2] - times[1] >= Duration::from_millis(80));
}

#[test]
fn test_enhanced_prompt_is_sent_upstream() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::new(vec![Ok(GenerationResponse::with_image(
        "image/png",
        png(100, 100),
    ))]);
    let orchestrator = GenerationOrchestrator::new(
        &generator,
        RetryPolicy::new(3, 1, 1),
        GenerationLimits::default(),
    );
    orchestrator
        .generate(&GenerationRequest::new(
            format!("   {}   ", PROMPT),
            dir.path().join("p.png"),
        ))
        .unwrap();

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains(&format!("Content: {}\n", PROMPT)));
}

#[test]
fn test_invalid_credentials_are_not_retried() {
    let generator = ScriptedGenerator::new(vec![
        Err(UpstreamError::credentials("API key not valid")),
        Ok(GenerationResponse::with_image("image/png", png(100, 100))),
    ]);
    let orchestrator = GenerationOrchestrator::new(
        &generator,
        RetryPolicy::new(3, 1, 1),
        GenerationLimits::default(),
    );
    let err = orchestrator
        .generate(&GenerationRequest::new(PROMPT, "/nonexistent/p.png"))
        .unwrap_err();

    assert!(matches!(
        err,
        PosterError::FatalUpstream(FatalUpstreamError::InvalidCredentials(_))
    ));
    assert_eq!(generator.call_times().len(), 1);
}

#[test]
fn test_too_long_prompt_makes_no_upstream_call() {
    let generator = ScriptedGenerator::new(vec![]);
    let orchestrator = GenerationOrchestrator::new(
        &generator,
        RetryPolicy::default(),
        GenerationLimits::default(),
    );
    let err = orchestrator
        .generate(&GenerationRequest::new("a".repeat(1001), "/tmp/unused.png"))
        .unwrap_err();

    assert!(matches!(
        err,
        PosterError::Input(InputError::PromptTooLong { len: 1001, .. })
    ));
    assert!(err.user_message().contains("too long"));
    assert!(generator.call_times().is_empty());
}

#[test]
fn test_blocked_keyword_makes_no_upstream_call() {
    let generator = ScriptedGenerator::new(vec![]);
    let orchestrator = GenerationOrchestrator::new(
        &generator,
        RetryPolicy::default(),
        GenerationLimits::default(),
    );
    let err = orchestrator
        .generate(&GenerationRequest::new(
            "A poster full of explicit imagery",
            "/tmp/unused.png",
        ))
        .unwrap_err();
    assert!(err.is_input());
    assert!(generator.call_times().is_empty());
}

#[test]
fn test_retries_exhausted_is_distinct_from_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("p.png");
    let generator = ScriptedGenerator::new(vec![]);
    let orchestrator = GenerationOrchestrator::new(
        &generator,
        RetryPolicy::new(3, 1, 2),
        GenerationLimits::default(),
    );
    let err = orchestrator
        .generate(&GenerationRequest::new(PROMPT, &output))
        .unwrap_err();

    assert!(err.is_fatal_upstream());
    assert!(!err.is_input());
    assert!(matches!(
        err,
        PosterError::FatalUpstream(FatalUpstreamError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(generator.call_times().len(), 3);
    assert!(!output.exists());
}

#[test]
fn test_second_image_part_is_used_when_first_is_too_small() {
    use postasy::generation::{Candidate, Part};

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("p.png");
    let response = GenerationResponse {
        candidates: vec![Candidate {
            parts: vec![
                Part::Text("Here you go".to_string()),
                Part::InlineImage {
                    mime_type: "image/png".to_string(),
                    data: vec![1, 2, 3],
                },
                Part::InlineImage {
                    mime_type: "image/png".to_string(),
                    data: png(120, 120),
                },
            ],
        }],
    };
    let generator = ScriptedGenerator::new(vec![Ok(response)]);
    let orchestrator = GenerationOrchestrator::new(
        &generator,
        RetryPolicy::new(3, 1, 1),
        GenerationLimits::default(),
    );

    let result = orchestrator
        .generate(&GenerationRequest::new(PROMPT, &output))
        .unwrap();
    assert_eq!(result.attempts, 1);
    assert_eq!(result.width, 120);
}
