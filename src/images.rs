//! Image placement helpers: list, add, delete, move, resize.
//!
//! Deleting an image through the renderer swaps it for a 1×1 transparent
//! pixmap rather than rewriting the page, so placement listings skip
//! those placeholders. Move and resize are delete-and-reinsert of the
//! extracted image bytes; the engine persists them with the compacting
//! save because the incremental form would keep every superseded copy.

use crate::config::{DEFAULT_IMAGE_WIDTH, IMAGE_PADDING, MIN_IMAGE_SIZE, PAGE_MARGIN};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::models::ImagePlacement;
use crate::render::DocumentSession;

/// Placements of a page in discovery order, placeholders skipped.
pub fn list_images(session: &dyn DocumentSession, page: usize) -> Result<Vec<ImagePlacement>> {
    let mut placements = Vec::new();
    for img in session.images(page)? {
        if img.pixel_width <= 1 && img.pixel_height <= 1 {
            continue;
        }
        placements.push(ImagePlacement {
            index: placements.len(),
            bbox: img.bbox.to_array(),
            width: img.bbox.width(),
            height: img.bbox.height(),
            xref: img.xref,
        });
    }
    Ok(placements)
}

/// Resolve a placement index to `(xref, rect)`.
fn find_image(
    session: &dyn DocumentSession,
    page: usize,
    image_index: usize,
) -> Result<(u32, Rect)> {
    let mut index = 0;
    for img in session.images(page)? {
        if img.pixel_width <= 1 && img.pixel_height <= 1 {
            continue;
        }
        if index == image_index {
            return Ok((img.xref, img.bbox));
        }
        index += 1;
    }
    Err(Error::NotFound(format!("Image {image_index} not found")))
}

/// Insert an image at `(x, y)`.
///
/// Unspecified dimensions are derived from the image's pixel size,
/// scaled down to [`DEFAULT_IMAGE_WIDTH`] and to what fits left of the
/// page edge. The final rectangle is clamped to the page.
pub fn add_image(
    session: &mut dyn DocumentSession,
    page: usize,
    x: f32,
    y: f32,
    image: &[u8],
    width: f32,
    height: f32,
) -> Result<()> {
    let page_rect = session.page_rect(page)?;
    let (mut width, mut height) = (width, height);

    if width <= 0.0 || height <= 0.0 {
        let (img_w, img_h) = session
            .image_size(image)
            .map_err(|e| Error::InvalidImage(e.to_string()))?;
        if img_w <= 0.0 || img_h <= 0.0 {
            return Err(Error::InvalidImage("empty image".to_string()));
        }
        let scale = (DEFAULT_IMAGE_WIDTH / img_w)
            .min((page_rect.width() - x - IMAGE_PADDING) / img_w);
        if width <= 0.0 {
            width = img_w * scale;
        }
        if height <= 0.0 {
            height = img_h * scale;
        }
    }

    let rect = Rect {
        x0: x,
        y0: y,
        x1: (x + width).min(page_rect.x1 - PAGE_MARGIN),
        y1: (y + height).min(page_rect.y1 - PAGE_MARGIN),
    };
    session.insert_image(page, rect, image)
}

/// Delete the placement at `image_index`.
pub fn delete_image(
    session: &mut dyn DocumentSession,
    page: usize,
    image_index: usize,
) -> Result<()> {
    let (xref, _rect) = find_image(session, page, image_index)?;
    session.delete_image(page, xref)
}

/// Move a placement to `(new_x, new_y)`, preserving its dimensions and
/// clamping to the page.
pub fn move_image(
    session: &mut dyn DocumentSession,
    page: usize,
    image_index: usize,
    new_x: f32,
    new_y: f32,
) -> Result<()> {
    let (xref, old_rect) = find_image(session, page, image_index)?;
    let bytes = session.extract_image(xref)?;
    let page_rect = session.page_rect(page)?;

    let w = old_rect.width();
    let h = old_rect.height();
    let x = new_x.clamp(0.0, (page_rect.width() - w).max(0.0));
    let y = new_y.clamp(0.0, (page_rect.height() - h).max(0.0));

    session.delete_image(page, xref)?;
    session.insert_image(page, Rect::new(x, y, x + w, y + h), &bytes)
}

/// Resize and reposition a placement, enforcing [`MIN_IMAGE_SIZE`] and
/// clamping to the page.
pub fn resize_image(
    session: &mut dyn DocumentSession,
    page: usize,
    image_index: usize,
    new_x: f32,
    new_y: f32,
    new_w: f32,
    new_h: f32,
) -> Result<()> {
    let (xref, _old_rect) = find_image(session, page, image_index)?;
    let bytes = session.extract_image(xref)?;
    let page_rect = session.page_rect(page)?;

    let w = new_w.max(MIN_IMAGE_SIZE);
    let h = new_h.max(MIN_IMAGE_SIZE);
    let x = new_x.clamp(0.0, (page_rect.width() - w).max(0.0));
    let y = new_y.clamp(0.0, (page_rect.height() - h).max(0.0));

    session.delete_image(page, xref)?;
    session.insert_image(page, Rect::new(x, y, x + w, y + h), &bytes)
}
