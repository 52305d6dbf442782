//! Color types and HSL ramps for overlay marks

use ratatui::style::Color;
use revscrub_core::MarkerClass;

/// RGB color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// HSL color (h: 0-360, s: 0-1, l: 0-1)
#[derive(Debug, Clone, Copy)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Parse hex color string (e.g., "#2ecc71" or "2ecc71")
pub fn parse_hex(s: &str) -> Result<Rgb, String> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 {
        return Err(format!(
            "invalid hex color: expected 6 characters, got {}",
            s.len()
        ));
    }

    let channel = |range: std::ops::Range<usize>, name: &str| {
        s.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(|| format!("invalid hex color: bad {} component in '{}'", name, s))
    };

    Ok(Rgb {
        r: channel(0..2, "red")?,
        g: channel(2..4, "green")?,
        b: channel(4..6, "blue")?,
    })
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = rgb.r as f32 / 255.0;
    let g = rgb.g as f32 / 255.0;
    let b = rgb.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f32::EPSILON {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < f32::EPSILON {
        let mut h = (g - b) / d;
        if g < b {
            h += 6.0;
        }
        h
    } else if (max - g).abs() < f32::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl {
        h: (h * 60.0).rem_euclid(360.0),
        s: s.clamp(0.0, 1.0),
        l: l.clamp(0.0, 1.0),
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0);
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    if s.abs() < f32::EPSILON {
        let v = (l * 255.0).round() as u8;
        return Rgb { r: v, g: v, b: v };
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let h_norm = h / 360.0;
    Rgb {
        r: (hue_to_rgb(p, q, h_norm + 1.0 / 3.0) * 255.0).round() as u8,
        g: (hue_to_rgb(p, q, h_norm) * 255.0).round() as u8,
        b: (hue_to_rgb(p, q, h_norm - 1.0 / 3.0) * 255.0).round() as u8,
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Both stops share a hue, so only saturation and lightness move
fn lerp_hsl(a: Hsl, b: Hsl, t: f32) -> Hsl {
    let t = t.clamp(0.0, 1.0);
    Hsl {
        h: b.h,
        s: lerp(a.s, b.s, t).clamp(0.0, 1.0),
        l: lerp(a.l, b.l, t).clamp(0.0, 1.0),
    }
}

/// Background ramp from a barely tinted dark shade up to the configured color
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    pub faint: Hsl,
    pub full: Hsl,
}

impl Ramp {
    pub fn from_base(base: Rgb) -> Self {
        let full = rgb_to_hsl(base);
        let faint = Hsl {
            h: full.h,
            s: full.s * 0.15,
            l: (full.l * 0.25).max(0.06),
        };
        Self { faint, full }
    }

    /// `intensity` 0.0 is the faint end, 1.0 the full color
    pub fn at(&self, intensity: f32) -> Color {
        let rgb = hsl_to_rgb(lerp_hsl(self.faint, self.full, intensity));
        Color::Rgb(rgb.r, rgb.g, rgb.b)
    }
}

/// Mark colors for both marker classes
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub added: Ramp,
    pub removed: Ramp,
}

pub const DEFAULT_ADDED: Rgb = Rgb { r: 0x3b, g: 0x5a, b: 0x3a };
pub const DEFAULT_REMOVED: Rgb = Rgb { r: 0x6a, g: 0x33, b: 0x36 };

impl Default for Palette {
    fn default() -> Self {
        Self {
            added: Ramp::from_base(DEFAULT_ADDED),
            removed: Ramp::from_base(DEFAULT_REMOVED),
        }
    }
}

impl Palette {
    /// Build from configured hex colors, falling back per color on parse errors
    pub fn from_hex(added: &str, removed: &str) -> Self {
        let resolve = |hex: &str, fallback: Rgb| {
            parse_hex(hex).unwrap_or_else(|err| {
                log::warn!("{err}, using default");
                fallback
            })
        };
        Self {
            added: Ramp::from_base(resolve(added, DEFAULT_ADDED)),
            removed: Ramp::from_base(resolve(removed, DEFAULT_REMOVED)),
        }
    }

    pub fn background(&self, class: MarkerClass, intensity: f32) -> Color {
        match class {
            MarkerClass::Added => self.added.at(intensity),
            MarkerClass::Deleted => self.removed.at(intensity),
        }
    }
}
