use anyhow::{Context, Result};
use pdfqa_common::{ModelDevice, SummaryLength};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub summary_length: SummaryLength,
    pub device: ModelDevice,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            upload_dir: PathBuf::from("."),
            summary_length: SummaryLength::default(),
            device: ModelDevice::Auto,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = lookup("PDFQA_BIND").unwrap_or(defaults.bind_addr);
        let upload_dir = lookup("PDFQA_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let max = parse_or(&lookup, "PDFQA_SUMMARY_MAX_LENGTH", defaults.summary_length.max)?;
        let min = parse_or(&lookup, "PDFQA_SUMMARY_MIN_LENGTH", defaults.summary_length.min)?;
        let device = parse_or(&lookup, "PDFQA_DEVICE", defaults.device)?;
        let max_upload_bytes =
            parse_or(&lookup, "PDFQA_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;

        Ok(Self {
            bind_addr,
            upload_dir,
            summary_length: SummaryLength::new(min, max)?,
            device,
            max_upload_bytes,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
