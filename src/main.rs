use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use postasy::compositor::{
    add_logo_to_poster, add_profile_overlay, CompanyInfo, LogoPosition, LogoSpec, ProfileData,
    ProfileField, WatermarkCompositor,
};
use postasy::config::Config;
use postasy::fonts::FontResolver;
use postasy::generation::{enhance_prompt, validate_prompt};
use postasy::pipeline::{PosterPipeline, PosterRequest};
use postasy::raster::parse_hex_color;
use postasy::storage::StorageLayout;
use std::path::{Path, PathBuf};

/// Postasy - generate and decorate marketing posters
#[derive(Parser, Debug)]
#[command(name = "postasy")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a poster from a prompt, then overlay and watermark it
    Generate {
        prompt: String,
        /// YAML or JSON file with profile fields
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Comma-separated profile fields to show, e.g. business_name,phone,logo
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Skip the watermark
        #[arg(long)]
        unlimited: bool,
    },
    /// Add the profile header and footer to an existing image
    Overlay {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        profile: PathBuf,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Watermark an image, or copy it untouched with --unlimited
    Watermark {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        unlimited: bool,
    },
    /// Place a logo on a poster
    Logo {
        poster: PathBuf,
        logo: PathBuf,
        output: PathBuf,
        /// top-left, top-right, top-center, bottom-left, bottom-right or bottom-center
        #[arg(long, default_value = "top-right")]
        position: String,
        #[arg(long, default_value_t = 100)]
        max_height: u32,
        #[arg(long, default_value_t = 20)]
        margin: u32,
        /// Backing plate colour as #RGB, #RRGGBB or #RRGGBBAA
        #[arg(long)]
        backing: Option<String>,
        /// YAML or JSON file with company details to print under the logo
        #[arg(long)]
        caption: Option<PathBuf>,
        /// Header preset: 80px, top-center, 30px margin on a white plate
        #[arg(long, conflicts_with_all = ["position", "max_height", "margin"])]
        header: bool,
    },
    /// Validate a prompt and print the text that would be sent upstream
    CheckPrompt { prompt: String },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .map_err(|e| anyhow!("Failed to load configuration {}: {}", path.display(), e))?,
        None => Config::default(),
    };
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_fields(fields: &[String]) -> Result<Vec<ProfileField>> {
    fields
        .iter()
        .filter(|f| !f.trim().is_empty())
        .map(|f| f.parse::<ProfileField>().map_err(anyhow::Error::from))
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    postasy::logging::init_subscriber(&config.logging)
        .context("Failed to initialize logging subsystem")?;

    tracing::info!(
        config_file = ?args.config,
        upload_root = %config.storage.upload_root.display(),
        model = %config.generation.model,
        "Configuration loaded successfully"
    );

    let fonts = FontResolver::new(config.fonts.clone());

    match args.command {
        Command::Generate {
            prompt,
            profile,
            fields,
            unlimited,
        } => {
            let mut request = PosterRequest::new(prompt).with_unlimited_access(unlimited);
            if let Some(path) = profile {
                let profile: ProfileData = read_yaml(&path)?;
                request = request.with_profile(profile, parse_fields(&fields)?);
            }

            let pipeline = PosterPipeline::from_config(&config)?;
            let outcome = pipeline
                .run(&request)
                .map_err(|e| anyhow!("{} ({})", e.user_message(), e))?;
            for degradation in &outcome.degradations {
                eprintln!("warning: {}", degradation);
            }
            println!("{}", outcome.path.display());
        }
        Command::Overlay {
            input,
            output,
            profile,
            fields,
        } => {
            let profile: ProfileData = read_yaml(&profile)?;
            let storage = StorageLayout::from_config(&config.storage);
            let report = add_profile_overlay(
                &input,
                &output,
                &profile,
                &parse_fields(&fields)?,
                &storage,
                &fonts,
            )?;
            for degradation in &report.degradations {
                eprintln!("warning: {}", degradation);
            }
            println!("{}", report.path.display());
        }
        Command::Watermark {
            input,
            output,
            unlimited,
        } => {
            let compositor = WatermarkCompositor::new(config.watermark.clone());
            let outcome = compositor.apply(&input, &output, unlimited, &fonts)?;
            if outcome.kind.is_skipped() {
                eprintln!("warning: watermark skipped, output is a copy of the input");
            }
            println!("{}", outcome.path.display());
        }
        Command::Logo {
            poster,
            logo,
            output,
            position,
            max_height,
            margin,
            backing,
            caption,
            header,
        } => {
            if max_height == 0 {
                bail!("--max-height must be positive");
            }
            let mut spec = if header {
                LogoSpec::poster_top()
            } else {
                let position: LogoPosition = position.parse()?;
                LogoSpec {
                    max_height,
                    position,
                    margin,
                    ..LogoSpec::default()
                }
            };
            if let Some(color) = backing {
                spec = spec.with_backing(parse_hex_color(&color)?);
            }
            if let Some(path) = caption {
                let info: CompanyInfo = read_yaml(&path)?;
                spec = spec.with_caption(info);
            }
            let written = add_logo_to_poster(&poster, &logo, &output, &spec, &fonts)?;
            println!("{}", written.display());
        }
        Command::CheckPrompt { prompt } => {
            let prompt = validate_prompt(&prompt)?;
            println!("{}", enhance_prompt(&prompt));
        }
    }

    Ok(())
}
