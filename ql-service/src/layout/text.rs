//! Text label rendering
//!
//! Turns lightly marked-up text (`<br>` line breaks, `<b>` bold lines) into
//! a fixed-width label image. All geometry is deterministic given the font
//! metrics: fixed canvas width, fixed margins, fixed inter-line spacing.

use crate::error::ServiceResult;
use crate::layout::font::{FontProvider, FontWeight};
use crate::settings::Alignment;
use image::{Rgb, RgbImage};

/// Printable width of the 62 mm tape every label is laid out for
pub const LABEL_WIDTH: u32 = 696;

/// Top/bottom margin and the left/right inset used by alignment
pub(crate) const MARGIN: i32 = 10;

/// Vertical gap between consecutive lines
pub(crate) const LINE_SPACING: u32 = 5;

/// Rendering options for a text label
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub font_size: f32,
    pub alignment: Alignment,
}

/// One parsed markup line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkupLine {
    pub(crate) text: String,
    pub(crate) weight: FontWeight,
}

/// Per-line measurements, computed and discarded within one layout pass
#[derive(Debug)]
pub(crate) struct LineMetric {
    pub(crate) line: MarkupLine,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Horizontal offset for a line of the given width
pub(crate) fn line_x(alignment: Alignment, canvas_width: u32, line_width: u32) -> i32 {
    let canvas_width = canvas_width as i32;
    let line_width = line_width as i32;
    match alignment {
        Alignment::Left => MARGIN,
        Alignment::Center => (canvas_width - line_width) / 2,
        Alignment::Right => canvas_width - line_width - MARGIN,
    }
}

/// Find the next `<br>` tag (`<br>`, `<br/>`, `<br />`) or newline
fn find_line_break(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b'\n' {
            return Some((i, i + 1));
        }
        if bytes[i] != b'<' || i + 3 > bytes.len() {
            continue;
        }
        if !bytes[i + 1].eq_ignore_ascii_case(&b'b') || !bytes[i + 2].eq_ignore_ascii_case(&b'r') {
            continue;
        }
        let mut j = i + 3;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'/') {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'>' {
            return Some((i, j + 1));
        }
    }
    None
}

/// Strip a whole-line `<b>...</b>` wrapper, selecting the bold weight
fn strip_bold(line: &str) -> MarkupLine {
    let trimmed = line.trim();
    let b = trimmed.as_bytes();

    let has_open =
        b.len() >= 3 && b[0] == b'<' && b[1].eq_ignore_ascii_case(&b'b') && b[2] == b'>';
    let has_close = b.len() >= 7
        && b[b.len() - 4] == b'<'
        && b[b.len() - 3] == b'/'
        && b[b.len() - 2].eq_ignore_ascii_case(&b'b')
        && b[b.len() - 1] == b'>';

    if has_open && has_close {
        MarkupLine {
            text: trimmed[3..trimmed.len() - 4].to_string(),
            weight: FontWeight::Bold,
        }
    } else {
        MarkupLine {
            text: line.to_string(),
            weight: FontWeight::Regular,
        }
    }
}

/// Split markup into ordered lines
///
/// Only `<br>` and `<b>` are interpreted; anything else is literal text.
pub(crate) fn parse_markup(markup: &str) -> Vec<MarkupLine> {
    let mut lines = Vec::new();
    let mut rest = markup;
    while let Some((start, end)) = find_line_break(rest) {
        lines.push(strip_bold(&rest[..start]));
        rest = &rest[end..];
    }
    lines.push(strip_bold(rest));
    lines
}

/// Measure every line of a block; returns the metrics and the block height
/// (sum of line heights and spacing, no trailing spacing, no outer margins)
pub(crate) fn measure_lines(
    font: &dyn FontProvider,
    markup: &str,
    opts: &TextOptions,
    line_spacing: u32,
) -> ServiceResult<(Vec<LineMetric>, u32)> {
    let lines = parse_markup(markup);

    let mut metrics = Vec::with_capacity(lines.len());
    let mut height = 0u32;
    for line in lines {
        let m = font.measure(&line.text, opts.font_size, line.weight)?;
        height += m.height + line_spacing;
        metrics.push(LineMetric {
            line,
            width: m.width,
            height: m.height,
        });
    }
    // The final line contributes no trailing spacing.
    if !metrics.is_empty() {
        height = height.saturating_sub(line_spacing);
    }

    Ok((metrics, height))
}

/// Render marked-up text into a fixed-width label image
pub fn render_text(
    font: &dyn FontProvider,
    markup: &str,
    opts: &TextOptions,
) -> ServiceResult<RgbImage> {
    render_text_block(font, markup, opts, LABEL_WIDTH, true)
}

/// Render a text block onto a canvas of the given width
///
/// `outer_margins` controls whether the top/bottom margins are included;
/// composite layouts add their own padding instead.
pub(crate) fn render_text_block(
    font: &dyn FontProvider,
    markup: &str,
    opts: &TextOptions,
    canvas_width: u32,
    outer_margins: bool,
) -> ServiceResult<RgbImage> {
    let (metrics, block_height) = measure_lines(font, markup, opts, LINE_SPACING)?;

    let total_height = if outer_margins {
        block_height + 2 * MARGIN as u32
    } else {
        block_height
    };

    let mut canvas = RgbImage::from_pixel(
        canvas_width,
        total_height.max(1),
        Rgb([255, 255, 255]),
    );

    let mut y = if outer_margins { MARGIN } else { 0 };
    for m in &metrics {
        let x = line_x(opts.alignment, canvas_width, m.width);
        font.draw(&mut canvas, x, y, &m.line.text, opts.font_size, m.line.weight)?;
        y += m.height as i32 + LINE_SPACING as i32;
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markup_line_breaks() {
        let lines = parse_markup("Hello<br>World");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[1].text, "World");

        assert_eq!(parse_markup("a<BR/>b<br />c").len(), 3);
        assert_eq!(parse_markup("a\nb").len(), 2);
        assert_eq!(parse_markup("no breaks").len(), 1);
    }

    #[test]
    fn test_parse_markup_bold_lines() {
        let lines = parse_markup("<b>Title</b><br>body");
        assert_eq!(lines[0].weight, FontWeight::Bold);
        assert_eq!(lines[0].text, "Title");
        assert_eq!(lines[1].weight, FontWeight::Regular);

        // A stray opening tag without its close stays literal.
        let lines = parse_markup("<b>half open");
        assert_eq!(lines[0].weight, FontWeight::Regular);
        assert_eq!(lines[0].text, "<b>half open");
    }

    #[test]
    fn test_line_x_offsets() {
        assert_eq!(line_x(Alignment::Left, 696, 100), 10);
        assert_eq!(line_x(Alignment::Center, 696, 100), 298);
        assert_eq!(line_x(Alignment::Right, 696, 100), 586);
    }

    #[test]
    fn test_line_x_overwide_line_goes_negative() {
        // Clipping happens at draw time; the offset itself may be negative.
        assert!(line_x(Alignment::Center, 696, 800) < 0);
    }
}
