//! Image Upload Handlers
//!
//! Handles image uploads from authenticated users.
//! Accepts PNG, JPEG and WebP, validates by decoding, and stores a
//! JPEG-recompressed copy under the uploads directory. Files are served
//! statically from `/uploads`.

use axum::Json;
use axum::extract::{Multipart, State};
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Maximum files per multi-upload request
const MAX_FILES_PER_REQUEST: usize = 5;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// JPEG quality for stored listing photos
const JPEG_QUALITY: u8 = 85;

/// Upload response for a single file
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub file_path: String,
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub file: UploadedFile,
}

#[derive(Debug, Serialize)]
pub struct MultiUploadResponse {
    pub success: bool,
    pub files: Vec<UploadedFile>,
    pub count: usize,
}

/// Validate image bytes: size, extension, decodability.
fn validate_image(data: &[u8], ext: &str) -> Result<(), AppError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::validation(format!(
            "File too large. Maximum size is {}MB",
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    let ext_lower = ext.to_lowercase();
    if !SUPPORTED_FORMATS.contains(&ext_lower.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported file format '{}'. Supported: {}",
            ext_lower,
            SUPPORTED_FORMATS.join(", ")
        )));
    }

    if let Err(e) = image::load_from_memory(data) {
        return Err(AppError::validation(format!(
            "Invalid image file ({}): {}",
            ext_lower, e
        )));
    }

    Ok(())
}

/// Recompress to JPEG with fixed quality.
fn compress_image(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::validation(format!("Invalid image: {}", e)))?;

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let rgb_img = img.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| AppError::internal(format!("Failed to compress image: {}", e)))?;
    }

    Ok(buffer)
}

/// Validate, compress and persist one uploaded file; returns its metadata.
fn store_image(state: &ServerState, original_name: &str, data: &[u8]) -> AppResult<UploadedFile> {
    let ext = PathBuf::from(original_name)
        .extension()
        .and_then(|ext| ext.to_str().map(|s| s.to_string()))
        .ok_or_else(|| {
            AppError::validation(format!("Invalid file extension for: {original_name}"))
        })?;

    validate_image(data, &ext)?;
    let compressed = compress_image(data)?;

    let images_dir = state.config.images_dir();
    fs::create_dir_all(&images_dir)
        .map_err(|e| AppError::internal(format!("Failed to create images directory: {}", e)))?;

    let file_id = Uuid::new_v4().to_string();
    let filename = format!("{file_id}.jpg");
    let file_path = images_dir.join(&filename);

    fs::write(&file_path, &compressed)
        .map_err(|e| AppError::internal(format!("Failed to save file: {}", e)))?;

    tracing::info!(
        original_name = %original_name,
        size = %compressed.len(),
        filename = %filename,
        "Image uploaded"
    );

    Ok(UploadedFile {
        file_path: format!("/uploads/images/{filename}"),
        filename,
        original_name: original_name.to_string(),
        size: compressed.len(),
        format: "jpg".to_string(),
    })
}

/// One multipart field's file payload
struct FilePart {
    original_name: String,
    data: Vec<u8>,
}

/// Collect file parts with the given field name.
async fn collect_files(
    multipart: &mut Multipart,
    field_name: &str,
    max: usize,
) -> AppResult<Vec<FilePart>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() != Some(field_name) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::validation("No filename provided in file field"))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?
            .to_vec();

        if data.is_empty() {
            return Err(AppError::validation("Empty file provided"));
        }

        files.push(FilePart {
            original_name,
            data,
        });

        if files.len() > max {
            return Err(AppError::validation(format!(
                "At most {max} files allowed per request"
            )));
        }
    }

    Ok(files)
}

/// POST /api/upload/image - 单图上传 (字段名 `image`)
pub async fn upload_image(
    State(state): State<ServerState>,
    _current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let files = collect_files(&mut multipart, "image", 1).await?;
    let part = files
        .into_iter()
        .next()
        .ok_or_else(|| AppError::validation("No image file provided"))?;

    let file = store_image(&state, &part.original_name, &part.data)?;

    Ok(Json(UploadResponse {
        success: true,
        file,
    }))
}

/// POST /api/upload/images - 多图上传 (字段名 `images`，最多 5 张)
pub async fn upload_images(
    State(state): State<ServerState>,
    _current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<MultiUploadResponse>> {
    let parts = collect_files(&mut multipart, "images", MAX_FILES_PER_REQUEST).await?;
    if parts.is_empty() {
        return Err(AppError::validation("No image files provided"));
    }

    let mut files = Vec::with_capacity(parts.len());
    for part in &parts {
        files.push(store_image(&state, &part.original_name, &part.data)?);
    }

    Ok(Json(MultiUploadResponse {
        success: true,
        count: files.len(),
        files,
    }))
}
