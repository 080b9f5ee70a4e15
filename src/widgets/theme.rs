use std::time::Duration;

use ratatui::style::Color;

use mentorboard::{config::ThemeMode, records::TagColor};

const LUMA_THRESHOLD: f32 = 0.6;
// Some terminals report noisy or transient luma right after startup; take a few
// samples and use the median to avoid a single bad read flipping the theme.
const LUMA_SAMPLES: usize = 5;
const LUMA_SAMPLE_DELAY: Duration = Duration::from_millis(20);

#[derive(Clone, Copy)]
pub struct Theme {
    bg: Color,
    panel_bg: Color,
    panel_bg_alt: Color,
    text: Color,
    text_muted: Color,
    accent: Color,
    accent_alt: Color,
    border: Color,
    selection_bg: Color,
    selection_fg: Color,
    warning: Color,
    error: Color,
    header_bg: Color,
    header_fg: Color,
    footer_bg: Color,
    footer_fg: Color,
    button_bg: Color,
    chip_positive: Color,
    chip_negative: Color,
    chip_fg: Color,
    tag_default: TagStyle,
}

/// Background and foreground of a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagStyle {
    pub bg: Color,
    pub fg: Color,
}

impl Theme {
    /// Resolves `Auto` by probing the terminal background.
    pub fn detect(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Auto => match detect_terminal_luma() {
                Some(luma) if luma > LUMA_THRESHOLD => Self::light(),
                _ => Self::dark(),
            },
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(12, 15, 20),
            panel_bg: Color::Rgb(17, 22, 29),
            panel_bg_alt: Color::Rgb(22, 27, 34),
            text: Color::Rgb(230, 237, 243),
            text_muted: Color::Rgb(154, 164, 178),
            accent: Color::Rgb(186, 230, 55),
            accent_alt: Color::Rgb(82, 196, 26),
            border: Color::Rgb(65, 76, 92),
            selection_bg: Color::Rgb(0, 58, 140),
            selection_fg: Color::Rgb(230, 237, 243),
            warning: Color::Rgb(224, 175, 104),
            error: Color::Rgb(247, 118, 142),
            header_bg: Color::Rgb(20, 20, 20),
            header_fg: Color::Rgb(255, 255, 255),
            footer_bg: Color::Rgb(38, 38, 38),
            footer_fg: Color::Rgb(255, 245, 102),
            button_bg: Color::Rgb(82, 115, 224),
            chip_positive: Color::Rgb(48, 99, 23),
            chip_negative: Color::Rgb(211, 32, 41),
            chip_fg: Color::Rgb(255, 255, 255),
            tag_default: TagStyle {
                bg: Color::Rgb(240, 245, 255),
                fg: Color::Rgb(3, 8, 82),
            },
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(247, 247, 245),
            panel_bg: Color::Rgb(255, 255, 255),
            panel_bg_alt: Color::Rgb(240, 241, 243),
            text: Color::Rgb(31, 35, 40),
            text_muted: Color::Rgb(91, 97, 110),
            accent: Color::Rgb(0, 58, 140),
            accent_alt: Color::Rgb(56, 158, 13),
            border: Color::Rgb(156, 163, 175),
            selection_bg: Color::Rgb(214, 228, 255),
            selection_fg: Color::Rgb(0, 58, 140),
            warning: Color::Rgb(180, 83, 9),
            error: Color::Rgb(217, 72, 15),
            header_bg: Color::Rgb(20, 20, 20),
            header_fg: Color::Rgb(255, 255, 255),
            footer_bg: Color::Rgb(38, 38, 38),
            footer_fg: Color::Rgb(255, 245, 102),
            button_bg: Color::Rgb(82, 115, 224),
            chip_positive: Color::Rgb(48, 99, 23),
            chip_negative: Color::Rgb(211, 32, 41),
            chip_fg: Color::Rgb(255, 255, 255),
            tag_default: TagStyle {
                bg: Color::Rgb(240, 245, 255),
                fg: Color::Rgb(3, 8, 82),
            },
        }
    }

    pub fn bg(&self) -> Color {
        self.bg
    }

    pub fn panel_bg(&self) -> Color {
        self.panel_bg
    }

    pub fn panel_bg_alt(&self) -> Color {
        self.panel_bg_alt
    }

    pub fn text(&self) -> Color {
        self.text
    }

    pub fn text_muted(&self) -> Color {
        self.text_muted
    }

    pub fn accent(&self) -> Color {
        self.accent
    }

    pub fn accent_alt(&self) -> Color {
        self.accent_alt
    }

    pub fn border(&self) -> Color {
        self.border
    }

    pub fn selection_bg(&self) -> Color {
        self.selection_bg
    }

    pub fn selection_fg(&self) -> Color {
        self.selection_fg
    }

    pub fn warning(&self) -> Color {
        self.warning
    }

    pub fn error(&self) -> Color {
        self.error
    }

    pub fn header_bg(&self) -> Color {
        self.header_bg
    }

    pub fn header_fg(&self) -> Color {
        self.header_fg
    }

    pub fn footer_bg(&self) -> Color {
        self.footer_bg
    }

    pub fn footer_fg(&self) -> Color {
        self.footer_fg
    }

    pub fn button_bg(&self) -> Color {
        self.button_bg
    }

    pub fn chip_positive(&self) -> Color {
        self.chip_positive
    }

    pub fn chip_negative(&self) -> Color {
        self.chip_negative
    }

    pub fn chip_fg(&self) -> Color {
        self.chip_fg
    }

    pub fn tag(&self, color: TagColor) -> TagStyle {
        let white = Color::Rgb(255, 255, 255);
        match color {
            TagColor::Default => self.tag_default,
            TagColor::Cyan => TagStyle {
                bg: Color::Rgb(19, 194, 194),
                fg: white,
            },
            TagColor::Green => TagStyle {
                bg: Color::Rgb(82, 196, 26),
                fg: white,
            },
            TagColor::Geekblue => TagStyle {
                bg: Color::Rgb(47, 84, 235),
                fg: white,
            },
            TagColor::Volcano => TagStyle {
                bg: Color::Rgb(250, 84, 28),
                fg: white,
            },
        }
    }
}

fn detect_terminal_luma() -> Option<f32> {
    let mut samples = Vec::with_capacity(LUMA_SAMPLES);
    for attempt in 0..LUMA_SAMPLES {
        if let Ok(luma) = terminal_light::luma()
            && luma.is_finite()
        {
            samples.push(luma);
        }
        if attempt + 1 < LUMA_SAMPLES {
            std::thread::sleep(LUMA_SAMPLE_DELAY);
        }
    }

    if samples.is_empty() {
        return None;
    }

    Some(median_luma(&mut samples))
}

fn median_luma(samples: &mut [f32]) -> f32 {
    samples.sort_by(|a, b| a.total_cmp(b));
    let mid = samples.len() / 2;
    if samples.len().is_multiple_of(2) {
        (samples[mid - 1] + samples[mid]) / 2.0
    } else {
        samples[mid]
    }
}
