use image::ImageError;
use thiserror::Error;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug, Error)]
pub enum LprErrorKind {
    #[error(transparent)]
    IOError(#[from] IOError),
    #[error(transparent)]
    ImageError(#[from] ImageError),
    #[error("could not initialize tesseract: {0}")]
    OcrInit(String),
    #[error("ocr failed: {0}")]
    Ocr(String),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    pub fn ocr_init(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::OcrInit(msg.into()))
    }

    pub fn ocr(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::Ocr(msg.into()))
    }
}

impl<T> From<T> for LprError
where T: Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for LprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl Error for LprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind().source()
    }
}
