use crate::response::error_response;
use axum::{extract::Multipart, http::StatusCode, response::Response};
use std::collections::HashMap;
use std::path::Path;

pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A fully buffered multipart form. Nothing is written to disk while reading.
#[derive(Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, Response> {
        let mut form = UploadForm::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    return Err(error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Malformed multipart body: {e}"),
                    ));
                }
            };

            let name = field.name().unwrap_or("").to_string();
            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Failed to read {name}: {e}"))
                })?;
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    },
                );
            } else {
                let text = field.text().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Failed to read {name}: {e}"))
                })?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Result<&str, Response> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Missing required field: {name}"),
                )
            })
    }

    pub fn id(&self, name: &str) -> Result<i64, Response> {
        self.text(name)?.parse().map_err(|_| {
            error_response(StatusCode::BAD_REQUEST, format!("{name} must be an integer"))
        })
    }

    /// The named file, required to carry `extension` (e.g. `"zip"`).
    pub fn file(&self, name: &str, extension: &str) -> Result<&UploadedFile, Response> {
        let file = self.files.get(name).ok_or_else(|| {
            error_response(StatusCode::BAD_REQUEST, format!("Missing file upload: {name}"))
        })?;

        let matches = Path::new(&file.file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Only .{extension} files are allowed for {name}"),
            ));
        }
        Ok(file)
    }
}

impl UploadedFile {
    /// File name with any client-supplied directories stripped.
    pub fn safe_name(&self) -> String {
        Path::new(&self.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}
