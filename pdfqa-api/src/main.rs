use anyhow::Result;
use pdfqa_api::{ServerConfig, serve};
use tracing_subscriber::{self, EnvFilter};

/// HTTP サーバー：PDF をアップロードして要約を受け取り、その内容に質問する
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(?config, "starting pdfqa server");

    serve(config).await.inspect_err(|e| {
        tracing::error!("server exited with error: {e:?}");
    })
}
