use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// MIME types the analysis service accepts
pub const SUPPORTED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

/// Per-file size limit (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of files per analysis request
pub const MAX_FILES: usize = 5;

pub const MSG_UNSUPPORTED_TYPE: &str = "PNG, JPEG 파일만 업로드 가능합니다.";
pub const MSG_FILE_TOO_LARGE: &str = "파일 크기는 10MB 이하만 허용됩니다.";

/// A candidate image on disk, described the way a browser `File` would be.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    /// Display name (final path component)
    pub name: String,
    pub path: PathBuf,
    /// MIME type derived from the extension
    pub mime: String,
    /// Size in bytes at selection time
    pub size: u64,
}

impl ImageFile {
    /// Describe a file on disk. Fails only if the file's metadata can't be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        if metadata.is_dir() {
            anyhow::bail!("{} is a directory", path.display());
        }
        Ok(Self::new(path, metadata.len()))
    }

    /// Build a descriptor without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let mime = mime_for_path(&path).to_string();
        ImageFile { name, path, mime, size }
    }

    /// Size formatted as megabytes with one decimal, e.g. "1.3 MB"
    pub fn size_label(&self) -> String {
        format!("{:.1} MB", self.size as f64 / 1024.0 / 1024.0)
    }
}

/// Map a file extension to the MIME type a browser would report.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Check type and size of a single file. Pure: depends only on the descriptor.
pub fn validate_image_file(file: &ImageFile) -> Result<(), String> {
    if !SUPPORTED_IMAGE_TYPES.contains(&file.mime.as_str()) {
        return Err(MSG_UNSUPPORTED_TYPE.to_string());
    }
    if file.size > MAX_FILE_SIZE {
        return Err(MSG_FILE_TOO_LARGE.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(mime: &str, size: u64) -> ImageFile {
        ImageFile {
            name: "shot".to_string(),
            path: PathBuf::from("shot"),
            mime: mime.to_string(),
            size,
        }
    }

    #[test]
    fn accepts_png_and_jpeg_variants() {
        for mime in SUPPORTED_IMAGE_TYPES {
            assert_eq!(validate_image_file(&file_with(mime, 1024)), Ok(()));
        }
    }

    #[test]
    fn rejects_unsupported_type_with_canonical_message() {
        let err = validate_image_file(&file_with("image/gif", 10)).unwrap_err();
        assert_eq!(err, "PNG, JPEG 파일만 업로드 가능합니다.");
    }

    #[test]
    fn size_limit_is_exclusive() {
        assert!(validate_image_file(&file_with("image/png", MAX_FILE_SIZE)).is_ok());
        let err = validate_image_file(&file_with("image/png", MAX_FILE_SIZE + 1)).unwrap_err();
        assert_eq!(err, MSG_FILE_TOO_LARGE);
    }

    #[test]
    fn type_is_checked_before_size() {
        let err = validate_image_file(&file_with("text/plain", MAX_FILE_SIZE * 2)).unwrap_err();
        assert_eq!(err, MSG_UNSUPPORTED_TYPE);
    }

    #[test]
    fn mime_from_extension_is_case_insensitive() {
        assert_eq!(mime_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.Jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.webp")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn new_derives_name_and_mime() {
        let f = ImageFile::new("/tmp/shots/holdings.jpg", 2048);
        assert_eq!(f.name, "holdings.jpg");
        assert_eq!(f.mime, "image/jpeg");
        assert_eq!(f.size, 2048);
    }

    #[test]
    fn open_reads_size_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        std::fs::write(&path, vec![0u8; 1500]).unwrap();
        let f = ImageFile::open(&path).unwrap();
        assert_eq!(f.size, 1500);
        assert_eq!(f.mime, "image/png");
    }

    #[test]
    fn open_rejects_directories_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFile::open(dir.path()).is_err());
        assert!(ImageFile::open(dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn size_label_has_one_decimal() {
        assert_eq!(file_with("image/png", 1024 * 1024).size_label(), "1.0 MB");
        assert_eq!(file_with("image/png", 1536 * 1024).size_label(), "1.5 MB");
    }
}
