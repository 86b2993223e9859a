pub mod qa;
pub mod summarize;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tch::Device;

pub use qa::{AnswerSpan, BertQuestionAnswerer, QuestionAnswerer};
pub use summarize::{BertSummarizer, SummaryLength, Summarizer};

/// モデルを実行するデバイス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelDevice {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl ModelDevice {
    pub fn to_tch(self) -> Device {
        match self {
            ModelDevice::Auto => Device::cuda_if_available(),
            ModelDevice::Cpu => Device::Cpu,
            ModelDevice::Cuda => Device::Cuda(0),
        }
    }
}

impl FromStr for ModelDevice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ModelDevice::Auto),
            "cpu" => Ok(ModelDevice::Cpu),
            "cuda" | "gpu" => Ok(ModelDevice::Cuda),
            other => bail!("unknown model device '{other}' (expected auto, cpu or cuda)"),
        }
    }
}

impl fmt::Display for ModelDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelDevice::Auto => "auto",
            ModelDevice::Cpu => "cpu",
            ModelDevice::Cuda => "cuda",
        };
        f.write_str(name)
    }
}

/// 全リクエストで共有する要約器と質問応答器
///
/// clone は安価。rust-bert 実装は呼び出しごとにモデルを構築するので、
/// ここには重いものを保持しない。
#[derive(Clone)]
pub struct Pipelines {
    pub summarizer: Arc<dyn Summarizer>,
    pub answerer: Arc<dyn QuestionAnswerer>,
    pub summary_length: SummaryLength,
}

impl Pipelines {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        answerer: Arc<dyn QuestionAnswerer>,
        summary_length: SummaryLength,
    ) -> Self {
        Self {
            summarizer,
            answerer,
            summary_length,
        }
    }

    /// rust-bert の学習済みパイプライン（BART-CNN 要約、DistilBERT SQuAD 質問応答）
    pub fn bert(summary_length: SummaryLength, device: ModelDevice) -> Self {
        Self::new(
            Arc::new(BertSummarizer::new(device)),
            Arc::new(BertQuestionAnswerer::new(device)),
            summary_length,
        )
    }

    pub fn summarize(&self, text: &str) -> Result<String> {
        self.summarizer.summarize(text, self.summary_length)
    }

    pub fn answer(&self, context: &str, question: &str) -> Result<AnswerSpan> {
        self.answerer.answer(context, question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_names() {
        assert_eq!("auto".parse::<ModelDevice>().unwrap(), ModelDevice::Auto);
        assert_eq!(" CPU ".parse::<ModelDevice>().unwrap(), ModelDevice::Cpu);
        assert_eq!("gpu".parse::<ModelDevice>().unwrap(), ModelDevice::Cuda);
        assert!("tpu".parse::<ModelDevice>().is_err());
    }

    #[test]
    fn device_display_round_trips_through_parse() {
        for device in [ModelDevice::Auto, ModelDevice::Cpu, ModelDevice::Cuda] {
            assert_eq!(device.to_string().parse::<ModelDevice>().unwrap(), device);
        }
    }

    #[test]
    fn cpu_maps_to_tch_cpu() {
        assert_eq!(ModelDevice::Cpu.to_tch(), Device::Cpu);
        assert_eq!(ModelDevice::Cuda.to_tch(), Device::Cuda(0));
    }

    struct Fixed;

    impl Summarizer for Fixed {
        fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
            Ok(format!("{}:{}:{}", length.min, length.max, text.len()))
        }
    }

    impl QuestionAnswerer for Fixed {
        fn answer(&self, context: &str, question: &str) -> Result<AnswerSpan> {
            Ok(AnswerSpan {
                text: format!("{question}/{context}"),
                score: 0.5,
            })
        }
    }

    #[test]
    fn pipelines_forward_configured_length() {
        let pipelines = Pipelines::new(
            Arc::new(Fixed),
            Arc::new(Fixed),
            SummaryLength::new(10, 20).unwrap(),
        );
        assert_eq!(pipelines.summarize("abcd").unwrap(), "10:20:4");
        assert_eq!(pipelines.answer("ctx", "q").unwrap().text, "q/ctx");
    }
}
