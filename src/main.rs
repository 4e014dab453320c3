use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "exam-grader",
    version,
    about = "Grade scanned exam answer sheets against an answer key"
)]
struct Cli {
    /// Answer sheet image (jpg/png). Reads stdin when omitted.
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Grade only this question (e.g. Q2) with the single-question ladder
    #[arg(short = 'q', long = "question")]
    question: Option<String>,

    /// Print the result as JSON
    #[arg(long = "json")]
    json: bool,

    /// Show the loaded answer key and exit
    #[arg(long = "show-answer-key")]
    show_answer_key: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Run the HTTP server on this address (e.g. 127.0.0.1:8080)
    #[arg(long = "server")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    exam_grader::logging::init(cli.verbose)?;

    let config = exam_grader::Config {
        settings_path: cli.read_settings.clone(),
        question: cli.question.clone(),
        json: cli.json,
        show_answer_key: cli.show_answer_key,
    };

    if let Some(addr) = cli.server {
        let settings = exam_grader::load_config_settings(&config)?;
        return exam_grader::server::run_server(settings, addr).await;
    }

    let image_bytes = if config.show_answer_key {
        None
    } else {
        Some(read_image(cli.image.as_deref())?)
    };

    let output = tokio::task::spawn_blocking(move || exam_grader::run(config, image_bytes))
        .await
        .with_context(|| "grading task failed")??;
    println!("{}", output.trim_end());
    Ok(())
}

fn read_image(path: Option<&str>) -> Result<Vec<u8>> {
    if let Some(path) = path {
        let path = Path::new(path);
        return fs::read(path).with_context(|| format!("failed to read image: {}", path.display()));
    }
    if io::stdin().is_terminal() {
        return Err(anyhow!("no image given: pass --image <path> or pipe image data on stdin"));
    }
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;
    if buffer.is_empty() {
        return Err(anyhow!("stdin is empty"));
    }
    Ok(buffer)
}
