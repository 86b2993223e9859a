use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub file_path: String,
    pub content: String, // 全ページをページ順に連結
    pub page_count: usize,
}

impl Document {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
