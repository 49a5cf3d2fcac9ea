//! Tuning constants and paths. The defaults are the values the demo image
//! `carImage/4.jpg` was tuned with.

use std::path::PathBuf;

/// Everything the plate heuristic and the OCR preprocessing depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectParams {
    /// Gaussian kernel size, odd.
    pub blur_kernel: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Douglas-Peucker epsilon used before taking bounding rects.
    pub approx_epsilon: f64,

    pub min_ratio: f64,
    pub max_ratio: f64,
    pub min_area: u32,
    pub max_area: u32,

    pub y_threshold: i32,
    pub x_threshold: i32,

    /// Member counts accepted without further checks.
    pub plate_char_counts: [usize; 2],
    /// Groups must be larger than this to be checked for uniformity.
    pub min_group_len: usize,
    pub max_width_diff: i32,
    pub max_height_diff: i32,
    pub max_x_gap: i32,

    pub row_tolerance: f64,
    /// Member count of the two-row commercial plate layout.
    pub two_row_count: usize,

    pub margin_x: i32,
    pub margin_y: i32,

    pub ocr_scale: u32,
    pub threshold_block: u32,
    pub threshold_c: i32,
    pub preview_scale: u32,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            canny_low: 100.0,
            canny_high: 300.0,
            approx_epsilon: 3.0,
            min_ratio: 0.5,
            max_ratio: 2.5,
            min_area: 100,
            max_area: 700,
            y_threshold: 50,
            x_threshold: 50,
            plate_char_counts: [7, 8],
            min_group_len: 3,
            max_width_diff: 15,
            max_height_diff: 15,
            max_x_gap: 100,
            row_tolerance: 20.0,
            two_row_count: 8,
            margin_x: 20,
            margin_y: 10,
            ocr_scale: 3,
            threshold_block: 21,
            threshold_c: 10,
            preview_scale: 2,
        }
    }
}

impl DetectParams {
    /// Sigma a vision library derives from a kernel size when none is given.
    pub fn kernel_sigma(kernel: u32) -> f32 {
        0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    /// `None` lets tesseract use its compiled-in data path.
    pub tessdata: Option<String>,
    pub buffer_lang: String,
    pub line_lang: String,
    /// Page segmentation mode of the single line pass.
    pub line_psm: u32,
    /// Resolution reported to tesseract for images carrying no DPI.
    pub source_dpi: i32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tessdata: None,
            buffer_lang: "kor".to_string(),
            line_lang: "kor".to_string(),
            line_psm: 7,
            source_dpi: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub processed: PathBuf,
    pub debug_log: PathBuf,
    pub snapshots: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("carImage/4.jpg"),
            processed: PathBuf::from("carImage/temp.jpg"),
            debug_log: PathBuf::from("debug_log.txt"),
            snapshots: None,
        }
    }
}


#[cfg(test)]
mod test {

    use super::{ DetectParams, OcrConfig };

    #[test]
    fn kernel_sigma_matches_common_derivation() {
        assert!((DetectParams::kernel_sigma(5) - 1.1).abs() < 1e-5);
        assert!((DetectParams::kernel_sigma(21) - 3.5).abs() < 1e-5);
    }

    #[test]
    fn ocr_defaults() {
        let config = OcrConfig::default();
        assert_eq!(config.tessdata, None);
        assert_eq!(config.line_psm, 7);
        assert_eq!(config.source_dpi, 300);
    }
}
