/// Image stages of the pipeline: everything that turns pixels into boxes
/// and a plate crop into something tesseract can read.

use image::{ imageops::FilterType, DynamicImage, GrayImage, Luma, Rgb, RgbImage };
use imageproc::{ contours, drawing, edges, filter, geometry, point::Point, rect::Rect };

use crate::config::DetectParams;

pub fn to_gray(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Gaussian blur with the sigma a `kernel` x `kernel` window implies.
pub fn blur(img: &GrayImage, kernel: u32) -> GrayImage {
    filter::gaussian_blur_f32(img, DetectParams::kernel_sigma(kernel))
}

pub fn detect_edges(img: &GrayImage, low: f32, high: f32) -> GrayImage {
    edges::canny(img, low, high)
}

fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32))
}

/// Bounding rect of every contour (outer and hole borders) found in a
/// binary edge map, after simplifying the contour polygon.
pub fn contour_bounding_rects(edge_img: &GrayImage, epsilon: f64) -> (usize, Vec<Rect>) {
    let found = contours::find_contours::<i32>(edge_img);
    let rects = found.iter().filter_map(|contour| {
        if contour.points.len() < 3 {
            return bounding_rect(&contour.points);
        }
        let poly = geometry::approximate_polygon_dp(&contour.points, epsilon, true);
        bounding_rect(&poly).or_else(|| bounding_rect(&contour.points))
    }).collect();
    (found.len(), rects)
}

/// Green 2px outlines on a black canvas.
pub fn draw_rects((width, height): (u32, u32), rects: &[Rect]) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    let green = Rgb([0, 255, 0]);
    for rect in rects {
        drawing::draw_hollow_rect_mut(&mut canvas, *rect, green);
        if rect.width() > 2 && rect.height() > 2 {
            let inner = Rect::at(rect.left() + 1, rect.top() + 1).of_size(rect.width() - 2, rect.height() - 2);
            drawing::draw_hollow_rect_mut(&mut canvas, inner, green);
        }
    }
    canvas
}

pub fn crop(img: &DynamicImage, rect: Rect) -> DynamicImage {
    img.crop_imm(rect.left().max(0) as u32, rect.top().max(0) as u32, rect.width(), rect.height())
}

pub fn enlarge(img: &DynamicImage, scale: u32) -> DynamicImage {
    img.resize_exact(img.width() * scale, img.height() * scale, FilterType::Triangle)
}

/// Binarize against a Gaussian weighted local mean: a pixel turns white
/// when it is brighter than `mean - c`. `block` is the odd window size the
/// weights are derived from.
pub fn adaptive_threshold_gaussian(img: &GrayImage, block: u32, c: i32) -> GrayImage {
    let mean = filter::gaussian_blur_f32(img, DetectParams::kernel_sigma(block));
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let src = img.get_pixel(x, y)[0] as i32;
        let local = mean.get_pixel(x, y)[0] as i32;
        if src > local - c { Luma([255]) } else { Luma([0]) }
    })
}

/// Grayscale, enlarge and binarize a plate crop for OCR.
pub fn prepare_for_ocr(plate: &DynamicImage, params: &DetectParams) -> GrayImage {
    let gray = DynamicImage::ImageLuma8(to_gray(plate));
    let enlarged = enlarge(&gray, params.ocr_scale).to_luma8();
    adaptive_threshold_gaussian(&enlarged, params.threshold_block, params.threshold_c)
}


#[cfg(test)]
mod test {

    use image::{ DynamicImage, GrayImage, Luma, RgbImage, Rgb };
    use imageproc::{ drawing, rect::Rect };

    use super::*;
    use crate::config::DetectParams;

    fn block_image() -> GrayImage {
        let mut img = GrayImage::new(100, 100);
        drawing::draw_filled_rect_mut(&mut img, Rect::at(30, 40).of_size(12, 20), Luma([255]));
        img
    }

    #[test]
    fn contour_rect_of_filled_block() {
        let (count, rects) = contour_bounding_rects(&block_image(), 3.0);
        assert_eq!(count, 1);
        assert_eq!(rects, vec![Rect::at(30, 40).of_size(12, 20)]);
    }

    #[test]
    fn blank_image_has_no_edges() {
        let img = GrayImage::from_pixel(64, 48, Luma([90]));
        let edge_img = detect_edges(&blur(&img, 5), 100.0, 300.0);
        assert!(edge_img.pixels().all(|p| p[0] == 0));
        let (count, rects) = contour_bounding_rects(&edge_img, 3.0);
        assert_eq!(count, 0);
        assert!(rects.is_empty());
    }

    #[test]
    fn block_outline_survives_blur_and_canny() {
        let edge_img = detect_edges(&blur(&block_image(), 5), 100.0, 300.0);
        assert!(edge_img.pixels().any(|p| p[0] == 255));
        let (_, rects) = contour_bounding_rects(&edge_img, 3.0);
        assert!(rects.iter().any(|r| {
            (r.left() - 30).abs() <= 2 && (r.top() - 40).abs() <= 2
                && (r.width() as i32 - 12).abs() <= 3 && (r.height() as i32 - 20).abs() <= 3
        }));
    }

    #[test]
    fn drawn_rects_are_green() {
        let canvas = draw_rects((50, 50), &[Rect::at(10, 10).of_size(10, 10)]);
        assert_eq!(canvas.get_pixel(10, 10), &Rgb([0, 255, 0]));
        assert_eq!(canvas.get_pixel(11, 15), &Rgb([0, 255, 0]));
        assert_eq!(canvas.get_pixel(15, 15), &Rgb([0, 0, 0]));
    }

    #[test]
    fn crop_follows_rect() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(80, 60));
        let plate = crop(&img, Rect::at(10, 5).of_size(40, 20));
        assert_eq!((plate.width(), plate.height()), (40, 20));
    }

    #[test]
    fn ocr_input_is_enlarged_and_binary() {
        let mut plate = RgbImage::from_pixel(40, 16, Rgb([200, 200, 200]));
        drawing::draw_filled_rect_mut(&mut plate, Rect::at(10, 4).of_size(4, 8), Rgb([20, 20, 20]));
        let processed = prepare_for_ocr(&DynamicImage::ImageRgb8(plate), &DetectParams::default());
        assert_eq!(processed.dimensions(), (120, 48));
        assert!(processed.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // the dark stroke is darker than its surroundings
        assert_eq!(processed.get_pixel(36, 24)[0], 0);
        assert_eq!(processed.get_pixel(100, 24)[0], 255);
    }

    #[test]
    fn flat_region_thresholds_white() {
        let img = GrayImage::from_pixel(30, 30, Luma([128]));
        let out = adaptive_threshold_gaussian(&img, 21, 10);
        assert!(out.pixels().all(|p| p[0] == 255));
    }
}
