use eframe::egui::Color32;
use palette::{named, Darken, Hsl, IntoColor, Srgb};

use crate::data::model::Diagnosis;

// ---------------------------------------------------------------------------
// Class colours
// ---------------------------------------------------------------------------

/// Fixed colour per predicted class, shared by every chart.
pub fn class_color(class: Diagnosis) -> Srgb<u8> {
    match class {
        Diagnosis::Cn => named::SKYBLUE,
        Diagnosis::Mci => named::LIGHTCORAL,
        Diagnosis::Ad => named::GOLD,
    }
}

/// A darker shade of `color` for outlines and text on top of it.
pub fn outline_color(color: Srgb<u8>) -> Srgb<u8> {
    let hsl: Hsl = color.into_format::<f32>().into_color();
    let darker: Srgb = hsl.darken(0.35).into_color();
    darker.into_format()
}

// ---------------------------------------------------------------------------
// Conversions to the three consumers (egui, PNG, HTML)
// ---------------------------------------------------------------------------

pub fn to_color32(color: Srgb<u8>) -> Color32 {
    Color32::from_rgb(color.red, color.green, color.blue)
}

pub fn to_pixel(color: Srgb<u8>) -> image::Rgb<u8> {
    image::Rgb([color.red, color.green, color.blue])
}

pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_colors_are_distinct() {
        let hexes: Vec<String> = Diagnosis::ALL
            .iter()
            .map(|&d| to_hex(class_color(d)))
            .collect();
        assert_eq!(hexes, vec!["#87ceeb", "#f08080", "#ffd700"]);
    }

    #[test]
    fn test_outline_is_darker() {
        let base = class_color(Diagnosis::Ad);
        let dark = outline_color(base);
        let luma = |c: Srgb<u8>| c.red as u32 + c.green as u32 + c.blue as u32;
        assert!(luma(dark) < luma(base));
    }
}
