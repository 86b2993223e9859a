use anyhow::{Context, Result, anyhow, ensure};
use log::{debug, info};
use rust_bert::pipelines::summarization::{SummarizationConfig, SummarizationModel};
use serde::{Deserialize, Serialize};

use crate::ModelDevice;

/// 要約の長さ（単位はモデルのトークン）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLength {
    pub min: u32,
    pub max: u32,
}

impl SummaryLength {
    pub const DEFAULT_MIN: u32 = 50;
    pub const DEFAULT_MAX: u32 = 150;

    pub fn new(min: u32, max: u32) -> Result<Self> {
        ensure!(max > 0, "summary max length must be positive");
        ensure!(
            min <= max,
            "summary min length {min} exceeds max length {max}"
        );
        Ok(Self { min, max })
    }
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// 文書全体のテキストから要約を1つ生成する
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String>;
}

/// rust-bert の要約パイプライン（呼び出しごとにモデルを読み込む）
#[derive(Debug, Clone, Copy, Default)]
pub struct BertSummarizer {
    device: ModelDevice,
}

impl BertSummarizer {
    pub fn new(device: ModelDevice) -> Self {
        Self { device }
    }

    pub fn config(&self, length: SummaryLength) -> SummarizationConfig {
        SummarizationConfig {
            min_length: i64::from(length.min),
            max_length: Some(i64::from(length.max)),
            do_sample: false,
            device: self.device.to_tch(),
            ..Default::default()
        }
    }
}

impl Summarizer for BertSummarizer {
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
        info!("Loading summarization model on {}", self.device);
        let model = SummarizationModel::new(self.config(length))
            .context("Failed to create summarization model")?;

        debug!("Summarizing {} characters", text.len());
        let summaries = model
            .summarize(&[text])
            .context("Failed to summarize text")?;

        summaries
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Summarization model returned no output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn default_length_is_fifty_to_one_fifty() {
        let length = SummaryLength::default();
        assert_eq!((length.min, length.max), (50, 150));
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(SummaryLength::new(200, 100).is_err());
        assert!(SummaryLength::new(0, 0).is_err());
        assert_eq!(
            SummaryLength::new(100, 100).unwrap(),
            SummaryLength { min: 100, max: 100 }
        );
    }

    #[test]
    fn config_uses_greedy_decoding_and_bounds() {
        let config = BertSummarizer::new(ModelDevice::Cpu).config(SummaryLength::default());
        assert_eq!(config.min_length, 50);
        assert_eq!(config.max_length, Some(150));
        assert!(!config.do_sample);
        assert_eq!(config.device, Device::Cpu);
    }
}
