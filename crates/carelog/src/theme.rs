use std::env;

use ratatui::style::{Color, Modifier, Style};

/// Terminal color capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    TrueColor,
    Ansi256,
    Ansi16,
}

impl ColorMode {
    /// Detect from the environment; `CARELOG_COLOR_MODE` overrides.
    pub fn detect() -> Self {
        if let Ok(v) = env::var("CARELOG_COLOR_MODE") {
            return match v.to_ascii_lowercase().as_str() {
                "24bit" | "truecolor" | "rgb" => ColorMode::TrueColor,
                "256" | "ansi256" => ColorMode::Ansi256,
                _ => ColorMode::Ansi16,
            };
        }
        if let Ok(v) = env::var("COLORTERM") {
            let l = v.to_ascii_lowercase();
            if l.contains("truecolor") || l.contains("24bit") {
                return ColorMode::TrueColor;
            }
        }
        if let Ok(v) = env::var("TERM") {
            if v.to_ascii_lowercase().contains("256color") {
                return ColorMode::Ansi256;
            }
        }
        ColorMode::Ansi16
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Calm clinical palette: blue-grays with a green confirm and a red alarm.
#[derive(Clone, Debug)]
pub struct Palette {
    pub fg: Rgb,
    pub dim: Rgb,
    pub border: Rgb,
    pub value: Rgb,
    pub success: Rgb,
    pub warn: Rgb,
    pub error: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            fg: Rgb(214, 219, 230),
            dim: Rgb(110, 118, 135),
            border: Rgb(62, 70, 88),
            value: Rgb(125, 196, 228),
            success: Rgb(140, 200, 120),
            warn: Rgb(226, 180, 100),
            error: Rgb(235, 110, 120),
        }
    }
}

/// Semantic style groups used across the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UiGroup {
    Border,
    Dimmed,
    Title,
    Label,
    Value,
    Focus,
    Error,
    Warn,
    Success,
}

/// Derived visual state of the submit control, computed by a per-form rule
/// from the live values (e.g. a life-threatening severity).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Accent {
    #[default]
    Default,
    Caution,
    Critical,
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub mode: ColorMode,
    pub palette: Palette,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ColorMode::detect(),
            palette: Palette::default(),
        }
    }
}

impl Theme {
    pub fn style(&self, group: UiGroup) -> Style {
        let p = &self.palette;
        match group {
            UiGroup::Border => Style::default().fg(self.color(p.border)),
            UiGroup::Dimmed => Style::default().fg(self.color(p.dim)),
            UiGroup::Title => Style::default()
                .fg(self.color(p.fg))
                .add_modifier(Modifier::BOLD),
            UiGroup::Label => Style::default().fg(self.color(p.fg)),
            UiGroup::Value => Style::default().fg(self.color(p.value)),
            UiGroup::Focus => Style::default()
                .fg(Color::Black)
                .bg(self.color(p.value))
                .add_modifier(Modifier::BOLD),
            UiGroup::Error => Style::default().fg(self.color(p.error)),
            UiGroup::Warn => Style::default().fg(self.color(p.warn)),
            UiGroup::Success => Style::default().fg(self.color(p.success)),
        }
    }

    /// Style of the submit hint under the given accent.
    pub fn accent_style(&self, accent: Accent) -> Style {
        let p = &self.palette;
        match accent {
            Accent::Default => Style::default()
                .fg(self.color(p.success))
                .add_modifier(Modifier::BOLD),
            Accent::Caution => Style::default()
                .fg(self.color(p.warn))
                .add_modifier(Modifier::BOLD),
            Accent::Critical => Style::default()
                .fg(self.color(p.error))
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        }
    }

    fn color(&self, rgb: Rgb) -> Color {
        match self.mode {
            ColorMode::TrueColor => Color::Rgb(rgb.0, rgb.1, rgb.2),
            ColorMode::Ansi256 => Color::Indexed(rgb_to_ansi256(rgb)),
            ColorMode::Ansi16 => ansi16_nearest(rgb),
        }
    }
}

/// Map to the xterm 6x6x6 color cube. Good enough for UI accents.
fn rgb_to_ansi256(rgb: Rgb) -> u8 {
    let scale = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * scale(rgb.0) + 6 * scale(rgb.1) + scale(rgb.2)
}

fn ansi16_nearest(rgb: Rgb) -> Color {
    let Rgb(r, g, b) = rgb;
    let bright = (r as u16 + g as u16 + b as u16) / 3 > 128;
    match (r > 128, g > 128, b > 128, bright) {
        (true, false, false, _) => Color::Red,
        (false, true, false, _) => Color::Green,
        (false, false, true, _) => Color::Blue,
        (true, true, false, _) => Color::Yellow,
        (true, false, true, _) => Color::Magenta,
        (false, true, true, _) => Color::Cyan,
        (_, _, _, true) => Color::White,
        _ => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_mapping_stays_in_range() {
        for rgb in [Rgb(0, 0, 0), Rgb(255, 255, 255), Rgb(120, 200, 64)] {
            let idx = rgb_to_ansi256(rgb);
            assert!((16..=231).contains(&idx));
        }
    }

    #[test]
    fn accent_styles_are_distinct() {
        let theme = Theme::default();
        let a = theme.accent_style(Accent::Default);
        let b = theme.accent_style(Accent::Critical);
        assert_ne!(a, b);
    }
}
