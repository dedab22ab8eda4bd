use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Advance used for a glyph the font cannot supply, as a share of the font size.
const FALLBACK_ADVANCE: f32 = 0.56;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of `text` in the first installed font matching `font_family`, or
/// `None` when no such font can be loaded.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Font-independent width estimate.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().filter(|ch| *ch != '\n').count() as f32 * font_size.max(0.0) * FALLBACK_ADVANCE
}

/// Measured width when a font is available, estimated otherwise.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| estimate_text_width(text, font_size))
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontMetrics>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = normalize_family_key(font_family);
        if !self.cache.contains_key(&key) {
            let metrics = self.load(font_family);
            if metrics.is_none() {
                tracing::debug!(family = font_family, "no font matched; estimating text width");
            }
            self.cache.insert(key.clone(), metrics);
        }
        self.cache
            .get_mut(&key)
            .and_then(|metrics| metrics.as_mut())
            .map(|metrics| metrics.width(text, font_size))
    }

    fn load(&mut self, font_family: &str) -> Option<FontMetrics> {
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(*name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontMetrics::parse(data.to_vec(), index))
            .flatten()
    }
}

/// Horizontal advances for one face. ASCII advances are read up front; other
/// characters are looked up on first use.
struct FontMetrics {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii: [u16; 128],
    extra: HashMap<char, u16>,
}

impl FontMetrics {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii,
            extra: HashMap::new(),
        })
    }

    fn width(&mut self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_ADVANCE;
        let missing: Vec<char> = text
            .chars()
            .filter(|ch| !ch.is_ascii() && !self.extra.contains_key(ch))
            .collect();
        if !missing.is_empty()
            && let Ok(face) = Face::parse(&self.data, self.index)
        {
            for ch in missing {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(0);
                self.extra.insert(ch, advance);
            }
        }

        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let ch = if ch == '\t' { ' ' } else { ch };
            let advance = if ch.is_ascii() {
                self.ascii[ch as usize]
            } else {
                self.extra.get(&ch).copied().unwrap_or(0)
            };
            width += if advance == 0 {
                fallback
            } else {
                advance as f32 * scale
            };
        }
        width
    }
}

fn normalize_family_key(font_family: &str) -> String {
    font_family
        .split(',')
        .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_ascii_lowercase())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_length_and_size() {
        assert_eq!(estimate_text_width("", 14.0), 0.0);
        let short = estimate_text_width("Ann", 10.0);
        let long = estimate_text_width("Annabel", 10.0);
        assert!(long > short);
        assert!((estimate_text_width("ab", 20.0) - 2.0 * estimate_text_width("a", 20.0)).abs() < 1e-4);
    }

    #[test]
    fn empty_text_measures_zero() {
        assert_eq!(measure_text_width("", 14.0, "sans-serif"), Some(0.0));
        assert_eq!(text_width("anything", 0.0, "sans-serif"), 0.0);
    }

    #[test]
    fn family_keys_ignore_quotes_and_case() {
        assert_eq!(
            normalize_family_key("\"Trebuchet MS\", Verdana , sans-serif"),
            "trebuchet ms,verdana,sans-serif"
        );
    }
}
