#![forbid(unsafe_code)]

use std::borrow::Cow;

use dw_core::geometry::Rect;
use dw_render::frame::Frame;
use dw_render::style::Style;
use unicode_width::UnicodeWidthStr;

use crate::Widget;
use crate::block::{Alignment, Block};

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span<'a> {
    pub content: Cow<'a, str>,
    pub style: Style,
}

impl<'a> Span<'a> {
    #[must_use]
    pub fn raw(content: impl Into<Cow<'a, str>>) -> Self {
        Self {
            content: content.into(),
            style: Style::new(),
        }
    }

    #[must_use]
    pub fn styled(content: impl Into<Cow<'a, str>>, style: Style) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.content.width()
    }
}

/// One line of spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line<'a> {
    pub spans: Vec<Span<'a>>,
}

impl<'a> Line<'a> {
    #[must_use]
    pub fn width(&self) -> usize {
        self.spans.iter().map(Span::width).sum()
    }
}

impl<'a> From<&'a str> for Line<'a> {
    fn from(s: &'a str) -> Self {
        Line {
            spans: vec![Span::raw(s)],
        }
    }
}

impl From<String> for Line<'_> {
    fn from(s: String) -> Self {
        Line {
            spans: vec![Span::raw(s)],
        }
    }
}

impl<'a> From<Span<'a>> for Line<'a> {
    fn from(span: Span<'a>) -> Self {
        Line { spans: vec![span] }
    }
}

impl<'a> From<Vec<Span<'a>>> for Line<'a> {
    fn from(spans: Vec<Span<'a>>) -> Self {
        Line { spans }
    }
}

/// A widget that renders multi-line styled text.
#[derive(Debug, Clone, Default)]
pub struct Paragraph<'a> {
    lines: Vec<Line<'a>>,
    block: Option<Block<'a>>,
    style: Style,
    wrap: bool,
    alignment: Alignment,
    scroll: u16,
}

impl<'a> Paragraph<'a> {
    pub fn new<L: Into<Line<'a>>>(lines: impl IntoIterator<Item = L>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Break lines at word boundaries to fit the width.
    #[must_use]
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    #[must_use]
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Skip this many lines from the top.
    #[must_use]
    pub fn scroll(mut self, lines: u16) -> Self {
        self.scroll = lines;
        self
    }

    fn layout_lines(&self, width: usize) -> Vec<Line<'a>> {
        if !self.wrap {
            return self.lines.clone();
        }
        self.lines
            .iter()
            .flat_map(|line| wrap_line(line, width))
            .collect()
    }
}

/// Greedy word wrap. Words wider than `width` are left for the renderer to clip.
fn wrap_line<'a>(line: &Line<'a>, width: usize) -> Vec<Line<'a>> {
    if width == 0 || line.width() <= width {
        return vec![line.clone()];
    }
    let mut out = Vec::new();
    let mut current = Line::default();
    let mut current_width = 0;
    for span in &line.spans {
        for word in span.content.split_inclusive(' ') {
            let word_width = word.trim_end().width();
            if current_width > 0 && current_width + word_width > width {
                out.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current
                .spans
                .push(Span::styled(word.to_owned(), span.style));
            current_width += word.width();
        }
    }
    if !current.spans.is_empty() {
        out.push(current);
    }
    out
}

fn align_x(area: Rect, line_width: usize, alignment: Alignment) -> u16 {
    let line_width = u16::try_from(line_width).unwrap_or(u16::MAX);
    match alignment {
        Alignment::Left => area.x,
        Alignment::Center => area.x + area.width.saturating_sub(line_width) / 2,
        Alignment::Right => area.x + area.width.saturating_sub(line_width),
    }
}

impl Widget for Paragraph<'_> {
    fn render(&self, area: Rect, frame: &mut Frame) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "Paragraph",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height
        )
        .entered();

        frame.buffer.set_style(area, self.style);
        let text_area = match &self.block {
            Some(block) => {
                block.render(area, frame);
                block.inner(area)
            }
            None => area,
        };
        if text_area.is_empty() {
            return;
        }

        let lines = self.layout_lines(usize::from(text_area.width));
        let visible = lines
            .iter()
            .skip(usize::from(self.scroll))
            .take(usize::from(text_area.height));
        for (row, line) in visible.enumerate() {
            let y = text_area.y + row as u16;
            let mut x = align_x(text_area, line.width(), self.alignment);
            for span in &line.spans {
                x = frame.print_text(
                    x,
                    y,
                    &span.content,
                    self.style.patch(span.style),
                    text_area.right(),
                );
            }
        }
    }
}
