use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rust_bert::pipelines::question_answering::{
    QaInput, QuestionAnsweringConfig, QuestionAnsweringModel,
};
use serde::{Deserialize, Serialize};

use crate::ModelDevice;

const TOP_K: i64 = 1;
const BATCH_SIZE: usize = 32;

/// 抽出された回答スパン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSpan {
    pub text: String,
    pub score: f64,
}

/// 文脈から質問に対する最良の回答スパンを抽出する
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, context: &str, question: &str) -> Result<AnswerSpan>;
}

/// rust-bert の抽出型質問応答（呼び出しごとにモデルを読み込む）
#[derive(Debug, Clone, Copy, Default)]
pub struct BertQuestionAnswerer {
    device: ModelDevice,
}

impl BertQuestionAnswerer {
    pub fn new(device: ModelDevice) -> Self {
        Self { device }
    }

    pub fn config(&self) -> QuestionAnsweringConfig {
        QuestionAnsweringConfig {
            device: self.device.to_tch(),
            ..Default::default()
        }
    }
}

impl QuestionAnswerer for BertQuestionAnswerer {
    fn answer(&self, context: &str, question: &str) -> Result<AnswerSpan> {
        info!("Loading question answering model on {}", self.device);
        let model = QuestionAnsweringModel::new(self.config())
            .context("Failed to create question answering model")?;

        debug!("Answering {question:?} over {} characters", context.len());
        let input = QaInput {
            question: question.to_string(),
            context: context.to_string(),
        };
        let best = model
            .predict(&[input], TOP_K, BATCH_SIZE)
            .into_iter()
            .next()
            .and_then(|answers| answers.into_iter().next())
            .ok_or_else(|| anyhow!("Question answering model returned no answer"))?;

        Ok(AnswerSpan {
            text: best.answer,
            score: best.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn config_targets_requested_device() {
        let config = BertQuestionAnswerer::new(ModelDevice::Cpu).config();
        assert_eq!(config.device, Device::Cpu);
    }
}
