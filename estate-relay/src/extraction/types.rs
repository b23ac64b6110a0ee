use axum::body::Bytes;

const DEFAULT_FILE_NAME: &str = "document";
const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded document held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub file_name: String,
    declared_content_type: Option<String>,
}

impl Upload {
    pub fn new(bytes: Bytes, file_name: Option<String>, content_type: Option<String>) -> Self {
        let file_name = file_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        Self {
            bytes,
            file_name,
            declared_content_type: content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The declared content type, or a guess from the file name when the
    /// client sent none or only the generic octet-stream type.
    pub fn content_type(&self) -> String {
        match self.declared_content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() && declared != OCTET_STREAM => {
                declared.to_string()
            }
            _ => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}

/// Ids of everything one extraction created on the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedResources {
    pub file_id: Option<String>,
    pub vector_store_id: Option<String>,
    pub thread_id: Option<String>,
    /// Set while a run exists that has not reached a terminal status.
    pub active_run_id: Option<String>,
}
