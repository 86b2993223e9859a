use anyhow::Result;
use log::info;
use pdfqa_common::{AnswerSpan, Pipelines};
use std::path::Path;

use crate::extract::extract_text;
use crate::model::Document;

/// 抽出済みの文書と、そのテキストに対して動くパイプライン
///
/// 抽出は [`DocumentQa::open`] で完了するため、要約と回答は常に全文を見る。
pub struct DocumentQa {
    document: Document,
    pipelines: Pipelines,
}

impl DocumentQa {
    pub fn open(path: &Path, pipelines: Pipelines) -> Result<Self> {
        let document = extract_text(path)?;
        Ok(Self::from_document(document, pipelines))
    }

    pub fn from_document(document: Document, pipelines: Pipelines) -> Self {
        Self {
            document,
            pipelines,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn summary(&self) -> Result<String> {
        info!("Summarizing {}", self.document.file_path);
        self.pipelines.summarize(&self.document.content)
    }

    pub fn answer(&self, question: &str) -> Result<AnswerSpan> {
        info!("Answering question against {}", self.document.file_path);
        self.pipelines.answer(&self.document.content, question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_pdf;
    use pdfqa_common::{QuestionAnswerer, SummaryLength, Summarizer};
    use std::fs;
    use std::sync::{Arc, Mutex};

    // 受け取ったテキストを記録するモック
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Summarizer for Recorder {
        fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(format!("summary<={}", length.max))
        }
    }

    impl QuestionAnswerer for Recorder {
        fn answer(&self, context: &str, question: &str) -> Result<AnswerSpan> {
            self.seen.lock().unwrap().push(context.to_string());
            Ok(AnswerSpan {
                text: question.to_uppercase(),
                score: 0.9,
            })
        }
    }

    #[test]
    fn summary_and_answer_share_extracted_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, sample_pdf(&["Rust is a language", "Cargo builds it"])).unwrap();

        let recorder = Arc::new(Recorder::default());
        let pipelines = Pipelines::new(recorder.clone(), recorder.clone(), SummaryLength::default());
        let session = DocumentQa::open(&path, pipelines).unwrap();

        assert_eq!(session.summary().unwrap(), "summary<=150");
        assert_eq!(session.answer("what builds it?").unwrap().text, "WHAT BUILDS IT?");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], session.document().content);
        assert!(seen[0].contains("Cargo builds it"));
    }

    #[test]
    fn open_fails_without_running_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let pipelines = Pipelines::new(recorder.clone(), recorder.clone(), SummaryLength::default());

        assert!(DocumentQa::open(&dir.path().join("missing.pdf"), pipelines).is_err());
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
