use log::{info, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("no uploaded document named {0:?}")]
    NotFound(String),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// アップロードファイルの識別子（常に単一のパス要素）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// クライアントが送ったファイル名の最後の要素だけを残す
    pub fn from_file_name(file_name: &str) -> Result<Self, StoreError> {
        let candidate = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        // 名前はそのまま保持し、空白だけの名前と . / .. は拒否する
        let trimmed = candidate.trim();

        if trimmed.is_empty() || trimmed == "." || trimmed == ".." || candidate.contains('\0') {
            return Err(StoreError::InvalidName(file_name.to_string()));
        }
        Ok(Self(candidate.to_string()))
    }

    /// [`DocumentRepository::save`] が返したキーを解析する
    pub fn parse(key: &str) -> Result<Self, StoreError> {
        let parsed = Self::from_file_name(key)?;
        if parsed.0 != key {
            return Err(StoreError::InvalidName(key.to_string()));
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub key: DocumentKey,
    pub path: PathBuf,
}

/// [`DocumentKey`] をファイルに対応付けるアップロードディレクトリ
///
/// 既存のキーで保存するとファイルは上書きされる。同じキーへの同時保存は
/// 調停しないので、最後の書き込みが残る。
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    root: PathBuf,
}

impl DocumentRepository {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            action: "create upload directory",
            path: root.clone(),
            source,
        })?;
        info!("Upload directory: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StoreError> {
        let key = DocumentKey::from_file_name(file_name)?;
        if key.as_str() != file_name {
            warn!("Stripped directory components from upload name {file_name:?}");
        }

        let path = self.root.join(key.as_str());
        fs::write(&path, bytes).map_err(|source| StoreError::Io {
            action: "write",
            path: path.clone(),
            source,
        })?;
        info!("Stored {} bytes as {}", bytes.len(), path.display());

        Ok(StoredFile { key, path })
    }

    pub fn resolve(&self, key: &str) -> Result<StoredFile, StoreError> {
        let key = DocumentKey::parse(key)?;
        let path = self.root.join(key.as_str());
        if !path.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(StoredFile { key, path })
    }
}
