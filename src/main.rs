use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use console::style;
use glob::{MatchOptions, Pattern, glob_with};
use indicatif::ProgressBar;
use log::{error, info, warn};
use pdfqa_common::{ModelDevice, Pipelines, SummaryLength};
use pdfqa_docs::DocumentQa;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// コマンドラインから PDF を要約し、質問する
#[derive(Debug, Parser)]
#[command(name = "pdfqa", version)]
struct Cli {
    /// 要約の最大長（モデルのトークン数）
    #[arg(long, env = "PDFQA_SUMMARY_MAX_LENGTH", default_value_t = SummaryLength::DEFAULT_MAX)]
    max_length: u32,

    /// 要約の最小長（モデルのトークン数）
    #[arg(long, env = "PDFQA_SUMMARY_MIN_LENGTH", default_value_t = SummaryLength::DEFAULT_MIN)]
    min_length: u32,

    /// 実行デバイス（auto / cpu / cuda）
    #[arg(long, env = "PDFQA_DEVICE", default_value_t = ModelDevice::Auto)]
    device: ModelDevice,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// PDF を要約する（ディレクトリなら中の *.pdf すべて）
    Summarize { path: PathBuf },
    /// PDF について質問に答える
    Ask { pdf: PathBuf, question: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let length = SummaryLength::new(cli.min_length, cli.max_length)?;
    let pipelines = Pipelines::bert(length, cli.device);

    match cli.command {
        Command::Summarize { path } => summarize_all(&path, pipelines).await,
        Command::Ask { pdf, question } => {
            let answer = with_spinner(format!("Reading {}", pdf.display()), move || {
                DocumentQa::open(&pdf, pipelines)?.answer(&question)
            })
            .await?;
            println!("{}", answer.text);
            info!("Answer score: {:.3}", answer.score);
            Ok(())
        }
    }
}

async fn summarize_all(path: &Path, pipelines: Pipelines) -> Result<()> {
    let pdfs = collect_pdfs(path)?;
    if pdfs.is_empty() {
        warn!("No PDF files found in {}", path.display());
        return Ok(());
    }

    info!("Summarizing {} PDF(s)", pdfs.len());
    let single = pdfs.len() == 1;

    for pdf in pdfs {
        let label = pdf.display().to_string();
        let pipelines = pipelines.clone();
        let result = with_spinner(format!("Summarizing {label}"), move || {
            DocumentQa::open(&pdf, pipelines)?.summary()
        })
        .await;

        match result {
            Ok(summary) if single => println!("{summary}"),
            Ok(summary) => println!("{}\n{summary}\n", style(&label).bold().cyan()),
            // 1ファイルの失敗で残りを止めない
            Err(e) if !single => error!("Failed to summarize {label}: {e:#}"),
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// PDF そのもの、またはディレクトリ直下の *.pdf を名前順で返す
fn collect_pdfs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let pattern = format!("{}/*.pdf", Pattern::escape(&path.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut pdfs: Vec<PathBuf> = glob_with(&pattern, options)
        .context("Failed to read glob pattern")?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

async fn with_spinner<T, F>(message: String, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = tokio::task::spawn_blocking(work)
        .await
        .context("Blocking task failed");
    spinner.finish_and_clear();
    result?
}
