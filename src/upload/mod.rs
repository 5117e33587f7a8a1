mod preview;
mod validate;

pub use preview::{DataUrlEncoder, PreviewEncoder};
pub use validate::{
    mime_for_path, validate_image_file, ImageFile, MAX_FILES, MAX_FILE_SIZE, SUPPORTED_IMAGE_TYPES,
};
#[cfg(test)]
pub use validate::{MSG_FILE_TOO_LARGE, MSG_UNSUPPORTED_TYPE};
