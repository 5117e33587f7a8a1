use super::ImageFile;
use anyhow::{Context, Result};
use base64::Engine;

/// Turns a selected file into something the UI can show as a preview.
pub trait PreviewEncoder {
    fn encode(&self, file: &ImageFile) -> Result<String>;
}

/// Reads the file from disk and encodes it as a `data:` URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlEncoder;

impl DataUrlEncoder {
    pub fn encode_bytes(mime: &str, bytes: &[u8]) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{};base64,{}", mime, payload)
    }
}

impl PreviewEncoder for DataUrlEncoder {
    fn encode(&self, file: &ImageFile) -> Result<String> {
        let bytes = std::fs::read(&file.path)
            .with_context(|| format!("Failed to read {}", file.path.display()))?;
        Ok(Self::encode_bytes(&file.mime, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_bytes_produces_padded_data_url() {
        assert_eq!(
            DataUrlEncoder::encode_bytes("image/png", b"hi"),
            "data:image/png;base64,aGk="
        );
    }

    #[test]
    fn encode_reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"abc").unwrap();
        let file = ImageFile::open(&path).unwrap();
        let url = DataUrlEncoder.encode(&file).unwrap();
        assert_eq!(url, "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn encode_fails_when_file_disappears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        std::fs::write(&path, b"x").unwrap();
        let file = ImageFile::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(DataUrlEncoder.encode(&file).is_err());
    }
}
