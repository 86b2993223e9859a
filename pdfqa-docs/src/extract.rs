use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

use crate::model::Document;

/// `path` の PDF の全ページを読み、ページ順にテキストを連結する
pub fn extract_text(path: &Path) -> Result<Document> {
    info!("Extracting text from {}", path.display());
    let pdf = lopdf::Document::load(path)
        .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
    Ok(collect_pages(&pdf, path))
}

/// メモリ上の PDF に対する [`extract_text`]
pub fn extract_text_from_mem(bytes: &[u8], file_path: &str) -> Result<Document> {
    let pdf = lopdf::Document::load_mem(bytes)
        .with_context(|| format!("Failed to parse PDF: {file_path}"))?;
    Ok(collect_pages(&pdf, Path::new(file_path)))
}

fn collect_pages(pdf: &lopdf::Document, path: &Path) -> Document {
    // get_pages は BTreeMap なのでページ番号の昇順
    let pages = pdf.get_pages();
    let mut content = String::new();

    for page_number in pages.keys() {
        match pdf.extract_text(&[*page_number]) {
            Ok(text) => content.push_str(&text),
            Err(e) => warn!(
                "Skipping unreadable page {page_number} of {}: {e}",
                path.display()
            ),
        }
    }

    debug!(
        "Extracted {} characters from {} pages",
        content.len(),
        pages.len()
    );

    Document {
        file_path: path.to_string_lossy().into_owned(),
        content,
        page_count: pages.len(),
    }
}
