use std::path::PathBuf;

use anyhow::anyhow;
use dotenvy::dotenv;
use tracing::{error, info};

mod config;
mod handlers;
mod llm;
mod makeover;
mod state;
mod utils;

use config::Config;
use handlers::file::{run_file_redesign, FileRedesignArgs};
use handlers::run_http_server;
use llm::GeminiClient;
use state::InputMode;
use utils::logging::init_logging;

#[derive(Debug)]
enum Command {
    Help,
    Serve,
    Redesign(FileRedesignArgs),
}

fn usage() -> &'static str {
    "Usage:\n  room-makeover [serve]\n  room-makeover redesign --image <path> --prompt <text> [--out <path>] [--mode upload|live]"
}

fn parse_mode(value: &str) -> anyhow::Result<InputMode> {
    match value.trim().to_lowercase().as_str() {
        "upload" => Ok(InputMode::Upload),
        "live" => Ok(InputMode::Live),
        other => Err(anyhow!("Invalid --mode value: {other}")),
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    match args.get(1).map(|value| value.as_str()) {
        None | Some("serve") => return Ok(Command::Serve),
        Some("redesign") => {}
        Some("--help") | Some("-h") => return Ok(Command::Help),
        Some(other) => return Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }

    let mut image_path: Option<PathBuf> = None;
    let mut prompt: Option<String> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut mode = InputMode::Upload;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--image" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --image"))?;
                image_path = Some(PathBuf::from(value));
            }
            "--prompt" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --prompt"))?;
                prompt = Some(value.clone());
            }
            "--out" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --out"))?;
                out_path = Some(PathBuf::from(value));
            }
            "--mode" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --mode"))?;
                mode = parse_mode(value)?;
            }
            "--help" | "-h" => {
                return Ok(Command::Help);
            }
            other => {
                return Err(anyhow!(
                    "Unknown redesign argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    let image_path = image_path.ok_or_else(|| anyhow!("--image is required"))?;
    let prompt = prompt.ok_or_else(|| anyhow!("--prompt is required"))?;

    Ok(Command::Redesign(FileRedesignArgs {
        image_path,
        prompt,
        out_path,
        mode,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;
    if matches!(command, Command::Help) {
        println!("{}", usage());
        return Ok(());
    }

    let config = Config::load()?;
    let _guards = init_logging(&config.log_level, &config.log_dir);

    let client = GeminiClient::from_config(&config).inspect_err(|err| {
        error!("Refusing to start: {err}");
    })?;

    match command {
        Command::Help => {}
        Command::Serve => {
            info!(
                "Starting room makeover service (brief_model={}, image_model={})",
                client.brief_model(),
                client.image_model()
            );
            run_http_server(&config, client).await?;
        }
        Command::Redesign(file_args) => {
            let report = run_file_redesign(&client, file_args).await?;
            info!(
                "Redesign session ended at {:?} with {} products",
                report.state.step,
                report.state.products.len()
            );
            println!("{}", report.summary);
            println!(
                "Saved {} and {}",
                report.image_path.display(),
                report.json_path.display()
            );
        }
    }

    Ok(())
}
