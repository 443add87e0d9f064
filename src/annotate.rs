//! Annotation rendering.
//!
//! Draws one detection onto a frame in place: a 3-pixel box outline in the
//! class color and a label bar with `"{class} {confidence}"` text. Boxes
//! arrive in raw model coordinates and are ordered and clamped to the frame
//! before any pixel is touched.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detect::{BoundingBox, Detection};
use crate::frame::Frame;

/// Outline thickness in pixels.
const BOX_THICKNESS: i32 = 3;
/// Labels never render above this row, so text stays inside the frame even
/// for boxes touching the top edge.
const LABEL_MIN_Y: i32 = 35;
/// Label text size.
const LABEL_SCALE: f32 = 18.0;
/// Padding around label text inside its bar.
const LABEL_PAD: i32 = 5;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// A font usable for label text.
pub struct LabelFont {
    font: FontVec,
    path: PathBuf,
}

impl LabelFont {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|_| anyhow::anyhow!("{} is not a usable font file", path.display()))?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Find a label font: an explicitly configured path first, then
    /// well-known system locations. Returns `None` (with a warning) when
    /// nothing usable exists; annotation then draws boxes and bars only.
    pub fn discover(explicit: Option<&Path>) -> Option<Self> {
        if let Some(path) = explicit {
            match Self::load(path) {
                Ok(font) => return Some(font),
                Err(e) => {
                    log::warn!("configured font unusable, trying system fonts: {e:#}");
                }
            }
        }

        for candidate in font_candidates() {
            if candidate.is_file() {
                if let Ok(font) = Self::load(&candidate) {
                    log::info!("label font: {}", candidate.display());
                    return Some(font);
                }
            }
        }

        log::warn!("no label font found; annotations will omit label text");
        None
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn font_candidates() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Order a raw box and clamp it to the frame.
///
/// Holds for every input, including inverted and fully out-of-range boxes:
/// the result satisfies `0 <= x1 <= x2 <= width` and
/// `0 <= y1 <= y2 <= height`.
pub fn clamp_box(bbox: &BoundingBox, width: u32, height: u32) -> (i32, i32, i32, i32) {
    let (lo_x, hi_x) = order(bbox.x1, bbox.x2);
    let (lo_y, hi_y) = order(bbox.y1, bbox.y2);
    let x1 = (lo_x as i32).clamp(0, width as i32);
    let x2 = (hi_x as i32).clamp(0, width as i32);
    let y1 = (lo_y as i32).clamp(0, height as i32);
    let y2 = (hi_y as i32).clamp(0, height as i32);
    (x1, y1, x2, y2)
}

fn order(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Draws detections onto frames.
pub struct AnnotationRenderer {
    font: Option<LabelFont>,
}

impl AnnotationRenderer {
    pub fn new(font: Option<LabelFont>) -> Self {
        Self { font }
    }

    /// Renderer with a discovered system font (if any).
    pub fn with_discovered_font(explicit: Option<&Path>) -> Self {
        Self::new(LabelFont::discover(explicit))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw one detection onto the frame, in place.
    pub fn render(&self, frame: &mut Frame, detection: &Detection) {
        let color = detection.label.display_color();
        let (x1, y1, x2, y2) = clamp_box(&detection.bbox, frame.width(), frame.height());
        let text = detection.display_label();

        frame.with_image_mut(|img| {
            self.draw_label(img, &text, x1, y1, color);
            draw_outline(img, x1, y1, x2, y2, color);
        });
    }

    fn draw_label(&self, img: &mut image::RgbImage, text: &str, x1: i32, y1: i32, color: Rgb<u8>) {
        let anchor_y = y1.max(LABEL_MIN_Y);
        let scale = PxScale::from(LABEL_SCALE);

        let (text_w, text_h) = match &self.font {
            Some(label_font) => {
                let (w, h) = text_size(scale, &label_font.font, text);
                (w as i32, h as i32)
            }
            // No font: keep the bar so the box still gets a visible tag.
            None => (text.len() as i32 * 9, LABEL_SCALE as i32),
        };

        let bar_h = text_h + 2 * LABEL_PAD;
        let bar_w = text_w + 2 * LABEL_PAD;
        let bar_top = anchor_y - bar_h;
        if bar_w <= 0 {
            return;
        }
        draw_filled_rect_mut(
            img,
            Rect::at(x1, bar_top).of_size(bar_w as u32, bar_h as u32),
            color,
        );

        if let Some(label_font) = &self.font {
            draw_text_mut(
                img,
                TEXT_COLOR,
                x1 + LABEL_PAD,
                bar_top + LABEL_PAD,
                scale,
                &label_font.font,
                text,
            );
        }
    }
}

/// 3-pixel hollow rectangle, drawn as inset passes over the clamped box.
fn draw_outline(img: &mut image::RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let w = (x2 - x1) - 2 * inset;
        let h = (y2 - y1) - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            img,
            Rect::at(x1 + inset, y1 + inset).of_size(w as u32, h as u32),
            color,
        );
    }
}
