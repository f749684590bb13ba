//! Ambient light/dark detection and the palettes derived from it.
//!
//! The widget restyles itself to match the presentation mode of its hosting
//! surface without the host having to pass a theme value through the
//! configuration channel. Detection is best-effort: sample the surface's
//! background color when reachable, otherwise fall back to the system-level
//! preference signal, otherwise assume dark.

use ratatui::style::Color;

pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Ambient inputs consumed by the theme adapter.
///
/// Kept behind a trait so the concrete detection strategy (terminal queries,
/// env probes, a fixed value in tests) can be swapped without touching widget
/// logic.
pub trait AmbientColorProbe {
    /// Best-effort sample of the hosting surface's background color. `None`
    /// when the surface cannot be queried.
    fn sample_background(&self) -> Option<Rgb>;

    /// System-level dark/light preference, used when the surface itself is
    /// unreachable. `None` when the system offers no signal.
    fn system_prefers_dark(&self) -> Option<bool>;
}

/// Perceptual luminance of an RGB color, normalized to `0.0..=1.0`. The
/// channel weights approximate human luminance perception.
pub fn luminance((r, g, b): Rgb) -> f32 {
    (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0
}

/// Classify a sampled background: below the midpoint is dark.
pub fn classify_background(rgb: Rgb) -> ThemeMode {
    if luminance(rgb) < 0.5 {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

/// Derive the current [`ThemeMode`] from the ambient signals.
pub fn detect_mode(probe: &dyn AmbientColorProbe) -> ThemeMode {
    if let Some(rgb) = probe.sample_background() {
        return classify_background(rgb);
    }

    match probe.system_prefers_dark() {
        Some(false) => ThemeMode::Light,
        // Default to the dark palette when no signal is available.
        Some(true) | None => ThemeMode::Dark,
    }
}

/// Resolved widget palette for one [`ThemeMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub mode: ThemeMode,
    /// Background of the composer surface.
    pub surface: Color,
    pub border: Color,
    pub text: Color,
    pub accent: Color,
    pub accent_text: Color,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self {
                mode,
                surface: Color::Rgb(0xF0, 0xF2, 0xF6),
                border: Color::Rgb(0xE0, 0xE0, 0xE0),
                text: Color::Rgb(0x26, 0x27, 0x30),
                accent: Color::Rgb(0xFF, 0x4B, 0x4B),
                accent_text: Color::Rgb(0xFF, 0xFF, 0xFF),
            },
            ThemeMode::Dark => Self {
                mode,
                surface: Color::Rgb(0x26, 0x27, 0x30),
                border: Color::Rgb(0x4A, 0x4A, 0x5A),
                text: Color::Rgb(0xFA, 0xFA, 0xFA),
                accent: Color::Rgb(0xFF, 0x4B, 0x4B),
                accent_text: Color::Rgb(0xFF, 0xFF, 0xFF),
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_mode(ThemeMode::Dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        background: Option<Rgb>,
        prefers_dark: Option<bool>,
    }

    impl AmbientColorProbe for FixedProbe {
        fn sample_background(&self) -> Option<Rgb> {
            self.background
        }
        fn system_prefers_dark(&self) -> Option<bool> {
            self.prefers_dark
        }
    }

    #[test]
    fn dark_terminal_background_classifies_dark() {
        assert!(luminance((20, 20, 24)) < 0.5);
        assert_eq!(classify_background((20, 20, 24)), ThemeMode::Dark);
    }

    #[test]
    fn light_terminal_background_classifies_light() {
        assert_eq!(classify_background((255, 255, 255)), ThemeMode::Light);
        assert_eq!(classify_background((0xF0, 0xF2, 0xF6)), ThemeMode::Light);
    }

    #[test]
    fn sampled_background_wins_over_system_preference() {
        let probe = FixedProbe {
            background: Some((250, 250, 250)),
            prefers_dark: Some(true),
        };
        assert_eq!(detect_mode(&probe), ThemeMode::Light);
    }

    #[test]
    fn falls_back_to_system_preference() {
        let probe = FixedProbe {
            background: None,
            prefers_dark: Some(false),
        };
        assert_eq!(detect_mode(&probe), ThemeMode::Light);

        let probe = FixedProbe {
            background: None,
            prefers_dark: Some(true),
        };
        assert_eq!(detect_mode(&probe), ThemeMode::Dark);
    }

    #[test]
    fn defaults_to_dark_when_no_signal_is_available() {
        let probe = FixedProbe {
            background: None,
            prefers_dark: None,
        };
        assert_eq!(detect_mode(&probe), ThemeMode::Dark);
    }

    #[test]
    fn palette_follows_mode() {
        let light = Theme::for_mode(ThemeMode::Light);
        let dark = Theme::for_mode(ThemeMode::Dark);
        assert_eq!(light.mode, ThemeMode::Light);
        assert_eq!(dark.mode, ThemeMode::Dark);
        // Both palettes share the accent; surface and text flip.
        assert_eq!(light.accent, dark.accent);
        assert_ne!(light.surface, dark.surface);
        assert_ne!(light.text, dark.text);
    }
}
