//! Fixed dashboard palette.

use dw_render::cell::PackedRgba;
use dw_render::style::Style;

use crate::domain::Severity;

pub mod palette {
    use super::PackedRgba;

    pub const BG_DEEP: PackedRgba = PackedRgba::rgb(16, 18, 24);
    pub const SURFACE: PackedRgba = PackedRgba::rgb(26, 29, 38);
    pub const OVERLAY: PackedRgba = PackedRgba::rgb(40, 44, 58);
    pub const FG_PRIMARY: PackedRgba = PackedRgba::rgb(220, 223, 230);
    pub const FG_SECONDARY: PackedRgba = PackedRgba::rgb(165, 170, 185);
    pub const FG_MUTED: PackedRgba = PackedRgba::rgb(105, 110, 128);
    pub const ACCENT: PackedRgba = PackedRgba::rgb(98, 160, 234);
    pub const SUCCESS: PackedRgba = PackedRgba::rgb(110, 190, 120);
    pub const WARNING: PackedRgba = PackedRgba::rgb(230, 180, 80);
    pub const ERROR: PackedRgba = PackedRgba::rgb(228, 88, 88);
    pub const SELECTION: PackedRgba = PackedRgba::rgb(52, 60, 84);
}

pub fn status_bar_style() -> Style {
    Style::new().bg(palette::OVERLAY).fg(palette::FG_PRIMARY)
}

pub fn panel_border_style() -> Style {
    Style::new().fg(palette::FG_MUTED)
}

pub fn panel_border_focused() -> Style {
    Style::new().fg(palette::ACCENT)
}

pub fn panel_bg() -> Style {
    Style::new().bg(palette::SURFACE)
}

pub fn selection() -> Style {
    Style::new().bg(palette::SELECTION).bold()
}

pub fn scrollbar() -> Style {
    Style::new().fg(palette::ACCENT)
}

pub fn severity(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::new().fg(palette::ERROR).bold(),
        Severity::Warning => Style::new().fg(palette::WARNING),
        Severity::Info => Style::new().fg(palette::ACCENT),
    }
}

pub fn acknowledged() -> Style {
    Style::new().fg(palette::SUCCESS)
}

pub fn unread() -> Style {
    Style::new().fg(palette::WARNING).bold()
}

pub fn secondary() -> Style {
    Style::new().fg(palette::FG_SECONDARY)
}

pub fn muted() -> Style {
    Style::new().fg(palette::FG_MUTED)
}

pub fn error() -> Style {
    Style::new().fg(palette::ERROR)
}
