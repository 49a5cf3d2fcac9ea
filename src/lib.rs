use image::{ DynamicImage, GrayImage, GenericImageView };
use imageproc::rect::Rect;
use log::info;

use std::cell::Cell;
use std::fs;
use std::path::Path;

use candidate::describe;
use config::DetectParams;
use error::LprError;
use ocr::PlateReader;
use utils::Viewer;

pub mod candidate;
pub mod config;
pub mod error;
pub mod image_process;
pub mod ocr;
pub mod utils;


/// A plate region found in a photo.
#[derive(Debug, Clone)]
pub struct Located {
    pub rect: Rect,
    pub plate: DynamicImage,
    /// Enlarged and binarized crop, ready for OCR.
    pub processed: GrayImage,
}

#[derive(Debug, Clone)]
pub struct Recognition {
    pub rect: Rect,
    /// Text read from the processed crop held in memory.
    pub buffer_text: String,
    /// Text read back from the saved crop as one line.
    pub line_text: String,
    pub plate_number: Option<String>,
}

pub struct Lpr {
    params: DetectParams,
    viewer: Viewer,
    contours: Cell<usize>,
}

impl Lpr {

    pub fn new(params: DetectParams, viewer: Viewer) -> Self {
        Lpr { params, viewer, contours: Cell::new(0) }
    }

    /// Contours found by the last `locate`, 0 before the first run.
    pub fn contour_count(&self) -> usize {
        self.contours.get()
    }

    /// Find the plate in one image. `Ok(None)` when nothing looks like a plate.
    pub fn locate(&self, img: &DynamicImage) -> Result<Option<Located>, LprError> {
        let params = &self.params;
        let viewer = &self.viewer;
        viewer.show("Original Image", img)?;

        let gray = image_process::to_gray(img);
        viewer.show("Gray Image", &DynamicImage::ImageLuma8(gray.clone()))?;

        let blurred = image_process::blur(&gray, params.blur_kernel);
        viewer.show("Blurred Image", &DynamicImage::ImageLuma8(blurred.clone()))?;

        let edge_img = image_process::detect_edges(&blurred, params.canny_low, params.canny_high);
        viewer.show("Edge Detection", &DynamicImage::ImageLuma8(edge_img.clone()))?;

        let (contour_count, rects) = image_process::contour_bounding_rects(&edge_img, params.approx_epsilon);
        self.contours.set(contour_count);
        info!("Detected contours: {}", contour_count);

        let selection = candidate::select_plate(&rects, img.dimensions(), params);
        let drawing = image_process::draw_rects(edge_img.dimensions(), &selection.filtered);
        viewer.show("Filtered Rectangles", &DynamicImage::ImageRgb8(drawing))?;

        if selection.filtered.is_empty() {
            info!("No suitable plate candidate found!");
            return Ok(None);
        }
        info!("Filtered Rectangles: {}", selection.filtered.len());
        for rect in &selection.filtered {
            info!("Filtered Rect: {}", describe(rect));
        }

        info!("Grouped Rectangles: {}", selection.groups.len());
        for (i, group) in selection.groups.iter().enumerate() {
            info!("Group {} - Size: {}", i + 1, group.len());
            for rect in group {
                info!("Rect: {}", describe(rect));
            }
        }

        info!("Valid Groups: {}", selection.valid.len());
        for rect in selection.valid.iter().flatten() {
            info!("Valid Rect: {}", describe(rect));
        }

        info!("Final Candidates: {}", selection.candidates.len());
        let (enclosing, rect) = match (selection.enclosing, selection.plate) {
            (Some(enclosing), Some(rect)) => (enclosing, rect),
            _ => {
                info!("No valid plate candidate found!");
                return Ok(None);
            }
        };
        for rect in &selection.candidates {
            info!("Rect: {}", describe(rect));
        }
        info!("Bounding Rect computed: {}", describe(&enclosing));
        info!("Plate Rect: {}", describe(&rect));

        let plate = image_process::crop(img, rect);
        viewer.show("Final Plate Candidate", &plate)?;

        let processed = image_process::prepare_for_ocr(&plate, params);
        viewer.show("Processed Plate", &DynamicImage::ImageLuma8(processed.clone()))?;

        Ok(Some(Located { rect, plate, processed }))
    }

    /// Locate the plate, save the processed crop to `processed_path` and
    /// read it twice: once from memory, once back from the file.
    pub fn recognize(&self, img: &DynamicImage, reader: &mut PlateReader, processed_path: impl AsRef<Path>)
        -> Result<Option<Recognition>, LprError>
    {
        let processed_path = processed_path.as_ref();
        let located = match self.locate(img)? {
            Some(located) => located,
            None => return Ok(None),
        };
        if let Some(dir) = processed_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        located.processed.save(processed_path)?;

        let buffer_text = reader.read_buffer(&located.processed)?;
        info!("Detected Plate Text: {}", buffer_text);

        let saved = image::open(processed_path)?;
        let preview = image_process::enlarge(&saved, self.params.preview_scale);
        self.viewer.show("EnlargedCarPlate", &preview)?;

        let line_text = reader.read_file(processed_path)?;
        let plate_number = ocr::extract_plate_number(&line_text);
        Ok(Some(Recognition { rect: located.rect, buffer_text, line_text, plate_number }))
    }
}


#[cfg(test)]
mod test {

    use image::{ DynamicImage, Rgb, RgbImage };
    use imageproc::{ drawing, rect::Rect };

    use std::error::Error;

    use super::Lpr;
    use crate::config::DetectParams;
    use crate::utils::Viewer;

    const CHAR_X0: i32 = 100;
    const CHAR_STEP: i32 = 24;
    const CHAR_Y: i32 = 80;

    /// Seven dark character blocks on a light plate on a mid gray car.
    fn synthetic_car() -> DynamicImage {
        let mut img = RgbImage::from_pixel(400, 200, Rgb([120, 120, 120]));
        drawing::draw_filled_rect_mut(&mut img, Rect::at(80, 60).of_size(190, 60), Rgb([250, 250, 250]));
        for i in 0..7 {
            let rect = Rect::at(CHAR_X0 + CHAR_STEP * i, CHAR_Y).of_size(12, 20);
            drawing::draw_filled_rect_mut(&mut img, rect, Rgb([10, 10, 10]));
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn locate_plate_in_synthetic_image() -> Result<(), Box<dyn Error>> {
        let lpr = Lpr::new(DetectParams::default(), Viewer::silent());
        let located = lpr.locate(&synthetic_car())?.ok_or("no plate found")?;
        let rect = located.rect;
        let last_right = CHAR_X0 + CHAR_STEP * 6 + 11;
        assert!(rect.left() <= CHAR_X0 && rect.right() >= last_right, "{:?}", rect);
        assert!(rect.top() <= CHAR_Y && rect.bottom() >= CHAR_Y + 19, "{:?}", rect);
        assert!(rect.right() < 400 && rect.bottom() < 200);
        assert_eq!(located.plate.width(), rect.width());
        assert_eq!(located.processed.width(), rect.width() * 3);
        assert_eq!(located.processed.height(), rect.height() * 3);
        // seven character outlines plus the plate border at least
        assert!(lpr.contour_count() >= 8, "{}", lpr.contour_count());
        Ok(())
    }

    #[test]
    fn blank_image_has_no_plate() -> Result<(), Box<dyn Error>> {
        let lpr = Lpr::new(DetectParams::default(), Viewer::silent());
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([60, 60, 60])));
        assert!(lpr.locate(&img)?.is_none());
        assert_eq!(lpr.contour_count(), 0);
        Ok(())
    }

    #[cfg(not(feature = "display-window"))]
    #[test]
    fn every_stage_is_shown() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let lpr = Lpr::new(DetectParams::default(), Viewer::new(Some(dir.path().to_path_buf())));
        lpr.locate(&synthetic_car())?.ok_or("no plate found")?;
        assert_eq!(lpr.viewer.shown(), 7);
        assert!(dir.path().join("07-processed-plate.png").exists());
        Ok(())
    }
}
