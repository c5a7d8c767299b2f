use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use dotenvy::dotenv;
use tracing::{debug, info, warn};

mod color;
mod config;
mod imaging;
mod llm;
mod session;
mod styles;
mod utils;

use config::CONFIG;
use imaging::upscale::MAX_DIMENSION;
use llm::gemini::GeminiImageEditor;
use llm::media::collect_input_photos;
use session::{PhotoSession, ReferenceMode, SessionOptions};
use styles::BoothStyle;
use utils::logging::init_logging;

fn usage() -> &'static str {
    "Usage:\n  purikura-booth [run] [--style <japanese|korean|newyork>] [--input <dir>] [--output <dir>] [--model <name>] [--count <n>] [--width <px>] [--chained] [--enforce-background|--no-enforce-background] [--edge-aware] [--no-grid]\n  purikura-booth styles\n  purikura-booth prompt <style> [--match|--chat|--system]"
}

#[derive(Debug, Default, PartialEq)]
struct RunArgs {
    style: Option<BoothStyle>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    model: Option<String>,
    count: Option<usize>,
    width: Option<u32>,
    chained: bool,
    enforce_background: Option<bool>,
    edge_aware: bool,
    no_grid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Master,
    Match,
    Chat,
    System,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(RunArgs),
    Styles,
    Prompt { style: BoothStyle, kind: PromptKind },
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str> {
    args.get(index)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("Missing value for {flag}\n{}", usage()))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid {flag} value: {value}\n{}", usage()))
}

fn parse_run_args(args: &[String]) -> Result<RunArgs> {
    let mut run = RunArgs::default();
    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--style" => {
                index += 1;
                run.style = Some(flag_value(args, index, flag)?.parse()?);
            }
            "--input" => {
                index += 1;
                run.input_dir = Some(PathBuf::from(flag_value(args, index, flag)?));
            }
            "--output" => {
                index += 1;
                run.output_dir = Some(PathBuf::from(flag_value(args, index, flag)?));
            }
            "--model" => {
                index += 1;
                run.model = Some(flag_value(args, index, flag)?.to_string());
            }
            "--count" => {
                index += 1;
                let count: usize = parse_number(flag_value(args, index, flag)?, flag)?;
                if count == 0 {
                    bail!("--count must be at least 1");
                }
                run.count = Some(count);
            }
            "--width" => {
                index += 1;
                let width: u32 = parse_number(flag_value(args, index, flag)?, flag)?;
                if width == 0 || width > MAX_DIMENSION {
                    bail!("--width must be between 1 and {MAX_DIMENSION}");
                }
                run.width = Some(width);
            }
            "--chained" => run.chained = true,
            "--enforce-background" => run.enforce_background = Some(true),
            "--no-enforce-background" => run.enforce_background = Some(false),
            "--edge-aware" => run.edge_aware = true,
            "--no-grid" => run.no_grid = true,
            "--help" | "-h" => return Err(anyhow!(usage())),
            other => bail!("Unknown run argument: {other}\n{}", usage()),
        }
        index += 1;
    }
    Ok(run)
}

fn parse_command(args: &[String]) -> Result<Command> {
    let rest = args.get(1..).unwrap_or_default();
    match rest.first().map(|value| value.as_str()) {
        None => Ok(Command::Run(RunArgs::default())),
        Some("run") => Ok(Command::Run(parse_run_args(&rest[1..])?)),
        Some("styles") => {
            if rest.len() > 1 {
                bail!("styles takes no arguments\n{}", usage());
            }
            Ok(Command::Styles)
        }
        Some("prompt") => {
            let style = rest
                .get(1)
                .ok_or_else(|| anyhow!("prompt requires a style\n{}", usage()))?
                .parse()?;
            let kind = match rest.get(2).map(|value| value.as_str()) {
                None => PromptKind::Master,
                Some("--match") => PromptKind::Match,
                Some("--chat") => PromptKind::Chat,
                Some("--system") => PromptKind::System,
                Some(other) => bail!("Unknown prompt argument: {other}\n{}", usage()),
            };
            if rest.len() > 3 {
                bail!("Too many prompt arguments\n{}", usage());
            }
            Ok(Command::Prompt { style, kind })
        }
        Some(flag) if flag.starts_with('-') => Ok(Command::Run(parse_run_args(rest)?)),
        Some(other) => bail!("Unknown command: {other}\n{}", usage()),
    }
}

fn prompt_text(style: BoothStyle, kind: PromptKind) -> &'static str {
    let profile = style.profile();
    match kind {
        PromptKind::Master => profile.prompt_master,
        PromptKind::Match => profile.prompt_match,
        PromptKind::Chat => profile.chat_prompt,
        PromptKind::System => profile.system_instruction,
    }
}

async fn run_session(args: RunArgs) -> Result<()> {
    if CONFIG.gemini_api_key.trim().is_empty() {
        bail!("GEMINI_API_KEY is required to run a session");
    }

    let style = match args.style {
        Some(style) => style,
        None => CONFIG.booth_style.parse()?,
    };
    let input_dir = args.input_dir.unwrap_or_else(|| CONFIG.input_dir.clone());
    let count = args.count.unwrap_or(CONFIG.photo_count);

    let mut options = SessionOptions::from_config(&CONFIG, style);
    if let Some(output_dir) = args.output_dir {
        options.output_dir = output_dir;
    }
    if let Some(model) = args.model {
        options.model = model;
    }
    if let Some(width) = args.width {
        options.target_width = width;
    }
    if args.chained {
        options.reference_mode = ReferenceMode::Chained;
    }
    options.enforce_background = args.enforce_background;
    if args.edge_aware {
        options.edge_aware_background = Some(true);
    }
    if args.no_grid {
        options.comparison_grid = false;
    }

    let inputs = collect_input_photos(&input_dir, count)?;
    if inputs.is_empty() {
        bail!("No .jpg, .jpeg or .png photos found in {}", input_dir.display());
    }
    if inputs.len() < count {
        warn!(
            "Found {} photos in {}, expected {}",
            inputs.len(),
            input_dir.display(),
            count
        );
    }

    let editor = GeminiImageEditor::from_config(&CONFIG);
    let session = PhotoSession::new(&editor, options);
    let summary = session.run(&inputs).await?;

    for photo in &summary.photos {
        match (&photo.output, &photo.error) {
            (Some(output), _) => info!(
                "Photo {}: {} -> {} model={} background={:.1}%",
                photo.index,
                photo.source.display(),
                output.display(),
                photo.model.as_deref().unwrap_or("-"),
                photo
                    .background
                    .map(|report| report.ratio() * 100.0)
                    .unwrap_or(0.0)
            ),
            (None, error) => warn!(
                "Photo {}: {} failed: {}",
                photo.index,
                photo.source.display(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    if let Some(grid) = &summary.grid {
        info!("Comparison grid: {}", grid.display());
    }
    info!(
        "Session summary: style={} succeeded={}/{}",
        summary.style,
        summary.succeeded(),
        summary.photos.len()
    );

    debug!("Session summary json: {}", serde_json::to_string(&summary)?);

    if summary.succeeded() == 0 {
        bail!("No photos were processed successfully");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    match parse_command(&args)? {
        Command::Styles => {
            for style in BoothStyle::ALL {
                let profile = style.profile();
                println!(
                    "{:<10} {} (background {})",
                    profile.key, profile.name, profile.background_color
                );
            }
            Ok(())
        }
        Command::Prompt { style, kind } => {
            println!("{}", prompt_text(style, kind));
            Ok(())
        }
        Command::Run(run_args) => {
            let _guards = init_logging();
            info!("Starting purikura-booth");
            run_session(run_args).await
        }
    }
}
