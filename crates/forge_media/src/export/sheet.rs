//! Print sheet: panels left to right with a caption strip under each.

use super::ExportPanel;
use crate::{ExportConfig, imaging};
use forge_error::{MediaError, MediaErrorKind};
use image::{Rgba, RgbaImage, imageops};
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument};

const MARGIN: u32 = 16;
const CAPTION_FONT_PX: u32 = 22;
const CAPTION_LINES: u32 = 4;
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn caption_height() -> u32 {
    CAPTION_LINES * CAPTION_FONT_PX * 5 / 4 + MARGIN
}

/// Lay `panels` out left to right at `gif_size` each, captioned, as a PNG.
///
/// # Errors
///
/// `NothingToExport` for an empty slice, `CaptionRender` if a caption
/// cannot be rasterised, or image decode/encode failures.
#[instrument(skip_all, fields(panels = panels.len()))]
pub fn export_sheet(panels: &[ExportPanel], config: &ExportConfig) -> Result<Vec<u8>, MediaError> {
    if panels.is_empty() {
        return Err(MediaError::new(MediaErrorKind::NothingToExport));
    }
    let tile = *config.gif_size();
    let count = u32::try_from(panels.len())
        .map_err(|_| {
            MediaError::new(MediaErrorKind::UnsupportedParameters("too many panels".into()))
        })?;
    let width = count * tile + (count + 1) * MARGIN;
    let height = tile + caption_height() + 2 * MARGIN;

    let mut sheet = RgbaImage::from_pixel(width, height, PAPER);
    for (slot, panel) in (0..count).zip(panels) {
        let x = MARGIN + slot * (tile + MARGIN);
        let image = imaging::letterbox(&imaging::decode(&panel.image)?, tile);
        imageops::overlay(&mut sheet, &image, i64::from(x), i64::from(MARGIN));

        let caption = render_caption(&panel.caption, tile, caption_height())?;
        imageops::overlay(&mut sheet, &caption, i64::from(x), i64::from(MARGIN + tile));
    }

    let bytes = imaging::encode_png(sheet)?;
    debug!(width, height, bytes = bytes.len(), "Rendered print sheet");
    Ok(bytes)
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            debug!(faces = db.len(), "Loaded caption fonts");
            Arc::new(db)
        })
        .clone()
}

/// Rasterise `text` centred in a `width`x`height` opaque strip.
fn render_caption(text: &str, width: u32, height: u32) -> Result<RgbaImage, MediaError> {
    let render_err = |msg: String| MediaError::new(MediaErrorKind::CaptionRender(msg));

    let svg = caption_svg(text, width, height);
    let options = usvg::Options {
        fontdb: font_database(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| render_err(e.to_string()))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| render_err(format!("cannot allocate {width}x{height} caption")))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // The strip has an opaque background, so premultiplied and straight
    // alpha are identical.
    RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| render_err("caption buffer size mismatch".into()))
}

fn caption_svg(text: &str, width: u32, height: u32) -> String {
    let max_chars = (width as usize * 2 / CAPTION_FONT_PX as usize).max(8);
    let line_height = CAPTION_FONT_PX * 5 / 4;
    let mut tspans = String::new();
    for (row, line) in wrap(text, max_chars)
        .into_iter()
        .take(CAPTION_LINES as usize)
        .enumerate()
    {
        let y = MARGIN / 2 + CAPTION_FONT_PX + row as u32 * line_height;
        tspans.push_str(&format!(
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            width / 2,
            y,
            escape_xml(&line)
        ));
    }
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\
         <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\
         <text font-family=\"sans-serif\" font-size=\"{CAPTION_FONT_PX}\" fill=\"#111111\" \
         text-anchor=\"middle\">{tspans}</text></svg>"
    )
}

/// Greedy word wrap at `max_chars` characters per line.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() { 0 } else { 1 } + word.chars().count();
        if !current.is_empty() && current.chars().count() + needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn escape_xml(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&apos;".to_string(),
            other => other.to_string(),
        })
        .collect()
}
