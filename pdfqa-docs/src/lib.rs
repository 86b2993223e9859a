pub mod extract;
pub mod model;
pub mod repository;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use extract::{extract_text, extract_text_from_mem};
pub use model::Document;
pub use repository::{DocumentKey, DocumentRepository, StoreError, StoredFile};
pub use session::DocumentQa;
