//! Picks the cluster of character shaped boxes that looks like a plate.
//!
//! Every step works on plain `Rect` lists so each rule can be checked on
//! its own. `select_plate` chains them and keeps the intermediate lists
//! around for the debug log.

use imageproc::rect::Rect;

use crate::config::DetectParams;

/// Exclusive right edge.
fn right_of(rect: &Rect) -> i32 {
    rect.left() + rect.width() as i32
}

/// Exclusive bottom edge.
fn bottom_of(rect: &Rect) -> i32 {
    rect.top() + rect.height() as i32
}

pub fn describe(rect: &Rect) -> String {
    format!("[x={}, y={}, w={}, h={}]", rect.left(), rect.top(), rect.width(), rect.height())
}

/// Keep boxes shaped like a single plate character.
pub fn filter_by_shape(rects: &[Rect], params: &DetectParams) -> Vec<Rect> {
    rects.iter().filter(|rect| {
        let ratio = rect.height() as f64 / rect.width() as f64;
        let area = rect.width() * rect.height();
        ratio >= params.min_ratio && ratio <= params.max_ratio
            && area >= params.min_area && area <= params.max_area
    }).copied().collect()
}

pub fn sort_by_left(rects: &mut [Rect]) {
    rects.sort_by_key(|rect| rect.left());
}

/// Greedy grouping: a box joins the first group whose first member sits on
/// about the same line and whose last member is close on the x axis.
pub fn group_rects(rects: &[Rect], params: &DetectParams) -> Vec<Vec<Rect>> {
    let mut groups: Vec<Vec<Rect>> = Vec::new();
    for rect in rects {
        let slot = groups.iter().position(|group| {
            let first = &group[0];
            let last = &group[group.len() - 1];
            (first.top() - rect.top()).abs() < params.y_threshold
                && (last.left() - rect.left()).abs() < params.x_threshold
        });
        match slot {
            Some(i) => groups[i].push(*rect),
            None => groups.push(vec![*rect]),
        }
    }
    groups
}

/// Neighbouring boxes must have similar sizes and no big holes between them.
pub fn is_uniform(group: &[Rect], params: &DetectParams) -> bool {
    group.windows(2).all(|pair| {
        let (prev, cur) = (&pair[0], &pair[1]);
        let width_diff = (cur.width() as i32 - prev.width() as i32).abs();
        let height_diff = (cur.height() as i32 - prev.height() as i32).abs();
        let x_gap = (cur.left() - right_of(prev)).abs();
        width_diff <= params.max_width_diff
            && height_diff <= params.max_height_diff
            && x_gap <= params.max_x_gap
    })
}

pub fn valid_groups(groups: &[Vec<Rect>], params: &DetectParams) -> Vec<Vec<Rect>> {
    groups.iter().filter(|group| {
        if params.plate_char_counts.contains(&group.len()) {
            true
        } else if group.len() > params.min_group_len {
            is_uniform(group, params)
        } else {
            false
        }
    }).cloned().collect()
}

/// All tops within `tolerance` of the mean top.
pub fn is_horizontal(group: &[Rect], tolerance: f64) -> bool {
    if group.is_empty() {
        return false;
    }
    let avg_y = group.iter().map(|rect| rect.top() as f64).sum::<f64>() / group.len() as f64;
    group.iter().all(|rect| (rect.top() as f64 - avg_y).abs() <= tolerance)
}

/// Flatten the groups laid out in one row, plus any group matching the
/// two-row commercial plate count.
pub fn final_candidates(groups: &[Vec<Rect>], params: &DetectParams) -> Vec<Rect> {
    groups.iter()
        .filter(|group| is_horizontal(group, params.row_tolerance) || group.len() == params.two_row_count)
        .flat_map(|group| group.iter().copied())
        .collect()
}

/// Bounding rect of the point set made of every top-left and (exclusive)
/// bottom-right corner, so `width = max_x - min_x + 1`.
pub fn enclosing_rect(rects: &[Rect]) -> Option<Rect> {
    let left = rects.iter().map(|r| r.left()).min()?;
    let top = rects.iter().map(|r| r.top()).min()?;
    let right = rects.iter().map(right_of).max()?;
    let bottom = rects.iter().map(bottom_of).max()?;
    Some(Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32))
}

/// Grow `rect` by the margins, staying inside a `width` x `height` image.
/// The origin moves by the margin (clamped at 0) while the size grows by
/// twice the margin, then the size is cut back at the image border.
pub fn expand_rect(rect: Rect, margin_x: i32, margin_y: i32, (width, height): (u32, u32)) -> Rect {
    let x = (rect.left() - margin_x).max(0);
    let y = (rect.top() - margin_y).max(0);
    let w = (rect.width() as i32 + 2 * margin_x).min(width as i32 - x).max(1);
    let h = (rect.height() as i32 + 2 * margin_y).min(height as i32 - y).max(1);
    Rect::at(x, y).of_size(w as u32, h as u32)
}

/// Every intermediate list of one selection run.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub filtered: Vec<Rect>,
    pub groups: Vec<Vec<Rect>>,
    pub valid: Vec<Vec<Rect>>,
    pub candidates: Vec<Rect>,
    pub enclosing: Option<Rect>,
    pub plate: Option<Rect>,
}

pub fn select_plate(rects: &[Rect], image_size: (u32, u32), params: &DetectParams) -> Selection {
    let mut filtered = filter_by_shape(rects, params);
    sort_by_left(&mut filtered);
    let groups = group_rects(&filtered, params);
    let valid = valid_groups(&groups, params);
    let candidates = final_candidates(&valid, params);
    let enclosing = enclosing_rect(&candidates);
    let plate = enclosing.map(|rect| expand_rect(rect, params.margin_x, params.margin_y, image_size));
    Selection { filtered, groups, valid, candidates, enclosing, plate }
}
