use image::{ GrayImage, ImageFormat };
use leptess::{ LepTess, Variable };
use log::info;
use regex::Regex;

use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::OcrConfig;
use crate::error::LprError;

/// Two or three digits, one hangul syllable, four digits: `12가3456`, `123가 4567`.
const PLATE_PATTERN: &str = r"\d{2,3}\s*\p{Hangul}\s*\d{4}";

/// Pull the plate number out of raw OCR text.
pub fn extract_plate_number(text: &str) -> Option<String> {
    static PLATE: OnceLock<Regex> = OnceLock::new();
    let re = PLATE.get_or_init(|| Regex::new(PLATE_PATTERN).expect("plate pattern compiles"));
    re.find(text).map(|m| m.as_str().to_string())
}

/// Tesseract, set up twice: one engine reading in-memory buffers with the
/// default segmentation, one reading files as a single text line.
pub struct PlateReader {
    buffer: LepTess,
    line: LepTess,
    dpi: i32,
}

impl PlateReader {

    pub fn new(config: &OcrConfig) -> Result<Self, LprError> {
        let tessdata = config.tessdata.as_deref();
        let buffer = LepTess::new(tessdata, &config.buffer_lang)
            .map_err(|e| LprError::ocr_init(format!("{} ({})", e, config.buffer_lang)))?;
        let mut line = LepTess::new(tessdata, &config.line_lang)
            .map_err(|e| LprError::ocr_init(format!("{} ({})", e, config.line_lang)))?;
        line.set_variable(Variable::TesseditPagesegMode, &config.line_psm.to_string())
            .map_err(|e| LprError::ocr_init(e.to_string()))?;
        info!("tesseract ready, buffer lang {}, line lang {} psm {}",
            config.buffer_lang, config.line_lang, config.line_psm);
        Ok(Self { buffer, line, dpi: config.source_dpi })
    }

    pub fn read_buffer(&mut self, img: &GrayImage) -> Result<String, LprError> {
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        self.buffer.set_image_from_mem(&png).map_err(|e| LprError::ocr(e.to_string()))?;
        // png carries no dpi; must follow set_image
        self.buffer.set_source_resolution(self.dpi);
        self.buffer.get_utf8_text().map_err(|e| LprError::ocr(e.to_string()))
    }

    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<String, LprError> {
        self.line.set_image(path.as_ref()).map_err(|e| LprError::ocr(e.to_string()))?;
        self.line.set_source_resolution(self.dpi);
        self.line.get_utf8_text().map_err(|e| LprError::ocr(e.to_string()))
    }
}


#[cfg(test)]
mod test {

    use super::extract_plate_number;

    #[test]
    fn plate_layouts() {
        assert_eq!(extract_plate_number("12가3456"), Some("12가3456".to_string()));
        assert_eq!(extract_plate_number("123가4567\n"), Some("123가4567".to_string()));
    }

    #[test]
    fn whitespace_inside_plate_is_kept() {
        assert_eq!(extract_plate_number("12가 3456"), Some("12가 3456".to_string()));
        assert_eq!(extract_plate_number("| 34 나  5678 ."), Some("34 나  5678".to_string()));
    }

    #[test]
    fn plate_found_inside_noise() {
        assert_eq!(extract_plate_number("~ ‘01허1234 ]\n\x0c"), Some("01허1234".to_string()));
    }

    #[test]
    fn no_plate() {
        assert_eq!(extract_plate_number(""), None);
        assert_eq!(extract_plate_number("1가3456"), None);
        assert_eq!(extract_plate_number("12가345"), None);
        assert_eq!(extract_plate_number("12A3456"), None);
    }
}
