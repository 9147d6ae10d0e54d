//! Multipart uploads with progress reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use weknora_core::ErrorEnvelope;

/// Size of the chunks file bodies are streamed in; progress is reported per chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes of file content handed to the transport so far.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f64 / self.total as f64
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone)]
struct FilePart {
    field: String,
    file_name: String,
    mime: Option<String>,
    bytes: Vec<u8>,
}

/// Fields and files of a multipart upload.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    texts: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.texts.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.files.push(FilePart {
            field: name.into(),
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        });
        self
    }

    /// Like [`UploadForm::file`] with an explicit content type.
    pub fn file_with_mime(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.files.push(FilePart {
            field: name.into(),
            file_name: file_name.into(),
            mime: Some(mime.into()),
            bytes: bytes.into(),
        });
        self
    }

    /// Total file bytes, the denominator of every progress event.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes.len() as u64).sum()
    }

    /// Build the transport form. File bodies are streamed so progress can be
    /// reported as the transport consumes them.
    pub(crate) fn into_multipart(
        self,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Form, ErrorEnvelope> {
        let tracker = Arc::new(ProgressTracker {
            loaded: AtomicU64::new(0),
            total: self.total_bytes(),
            callback: on_progress,
        });

        let mut form = Form::new();
        for (name, value) in self.texts {
            form = form.text(name, value);
        }

        for file in self.files {
            let len = file.bytes.len() as u64;
            let chunks: Vec<Vec<u8>> = file.bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
            let tracker = tracker.clone();
            let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
                tracker.advance(chunk.len() as u64);
                Ok::<_, std::io::Error>(chunk)
            }));

            let mut part = Part::stream_with_length(Body::wrap_stream(stream), len)
                .file_name(file.file_name);
            if let Some(mime) = file.mime {
                part = part
                    .mime_str(&mime)
                    .map_err(|e| ErrorEnvelope::encode(format!("invalid content type {mime:?}: {e}")))?;
            }
            form = form.part(file.field, part);
        }

        Ok(form)
    }
}

struct ProgressTracker {
    loaded: AtomicU64,
    total: u64,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    fn advance(&self, bytes: u64) {
        let loaded = self.loaded.fetch_add(bytes, Ordering::AcqRel) + bytes;
        if let Some(callback) = &self.callback {
            callback(UploadProgress {
                loaded: loaded.min(self.total),
                total: self.total,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_counts_only_file_bytes() {
        let form = UploadForm::new()
            .text("kb_id", "kb-1")
            .file("file", "a.txt", vec![0u8; 10])
            .file_with_mime("file", "b.pdf", "application/pdf", vec![1u8; 5]);
        assert_eq!(form.total_bytes(), 15);
    }

    #[test]
    fn fraction_of_empty_upload_is_complete() {
        assert_eq!(UploadProgress { loaded: 0, total: 0 }.fraction(), 1.0);
        assert_eq!(UploadProgress { loaded: 5, total: 10 }.fraction(), 0.5);
    }

    #[test]
    fn invalid_mime_is_an_encode_error() {
        let form = UploadForm::new().file_with_mime("file", "x", "not a mime", vec![1u8]);
        let err = form.into_multipart(None).unwrap_err();
        assert_eq!(err.kind(), weknora_core::ErrorKind::Encode);
    }
}
