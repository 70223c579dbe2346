//! Colour specifications as they appear in instruction files.
//!
//! Accepted forms: CSS/X11 colour names (case-insensitive), `#rgb`, `#rgba`,
//! `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` and JSON arrays
//! `[r, g, b]` / `[r, g, b, a]`.

use std::fmt;
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color specification '{0}'")]
pub struct ColorError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Canvas pixel. The canvas has no alpha channel, so alpha is dropped.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }

    pub fn from_json(value: &JsonValue) -> Result<Self, ColorError> {
        match value {
            JsonValue::String(s) => s.parse(),
            JsonValue::Array(items) => {
                let channels: Option<Vec<u8>> = items
                    .iter()
                    .map(|v| v.as_f64().map(clamp_channel))
                    .collect();
                match channels.as_deref() {
                    Some([r, g, b]) => Ok(Color::rgb(*r, *g, *b)),
                    Some([r, g, b, a]) => Ok(Color {
                        r: *r,
                        g: *g,
                        b: *b,
                        a: *a,
                    }),
                    _ => Err(ColorError(value.to_string())),
                }
            }
            other => Err(ColorError(other.to_string())),
        }
    }
}

fn clamp_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        let err = || ColorError(s.to_string());
        if let Some(hex) = spec.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }
        let lower = spec.to_ascii_lowercase();
        if let Some(args) = function_args(&lower, "rgba") {
            return parse_channels(args, 4).ok_or_else(err);
        }
        if let Some(args) = function_args(&lower, "rgb") {
            return parse_channels(args, 3).ok_or_else(err);
        }
        named(&lower).ok_or_else(err)
    }
}

fn function_args<'a>(spec: &'a str, name: &str) -> Option<&'a str> {
    spec.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_channels(args: &str, count: usize) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != count {
        return None;
    }
    let mut channels = [255u8; 4];
    for (i, part) in parts.iter().enumerate() {
        channels[i] = if let Some(pct) = part.strip_suffix('%') {
            clamp_channel(pct.trim().parse::<f64>().ok()? * 255.0 / 100.0)
        } else if i == 3 && part.contains('.') {
            // fractional alpha in [0, 1]
            clamp_channel(part.parse::<f64>().ok()? * 255.0)
        } else {
            clamp_channel(part.parse::<f64>().ok()?)
        };
    }
    let [r, g, b, a] = channels;
    Some(Color { r, g, b, a })
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color {
            r: nibble(0)?,
            g: nibble(1)?,
            b: nibble(2)?,
            a: nibble(3)?,
        }),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

fn named(name: &str) -> Option<Color> {
    let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    NAMED_COLORS
        .binary_search_by(|(candidate, _)| (*candidate).cmp(name.as_str()))
        .ok()
        .map(|i| {
            let rgb = NAMED_COLORS[i].1;
            Color::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
        })
}

// Sorted by name for binary search.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!("Red".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert_eq!("cornflowerblue".parse::<Color>(), Ok(Color::rgb(100, 149, 237)));
        assert_eq!("Light Gray".parse::<Color>(), Ok(Color::rgb(211, 211, 211)));
    }

    #[test]
    fn hex_forms() {
        assert_eq!("#f00".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert_eq!("#00ff0080".parse::<Color>().unwrap().a, 0x80);
        assert_eq!("#123456".parse::<Color>(), Ok(Color::rgb(0x12, 0x34, 0x56)));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#ggg".parse::<Color>().is_err());
    }

    #[test]
    fn functional_forms() {
        assert_eq!("rgb(10, 20, 30)".parse::<Color>(), Ok(Color::rgb(10, 20, 30)));
        assert_eq!("RGBA(10,20,30,0.5)".parse::<Color>().unwrap().a, 128);
        assert_eq!("rgb(100%, 0%, 0%)".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert!("rgb(1, 2)".parse::<Color>().is_err());
    }

    #[test]
    fn json_arrays_and_rejections() {
        assert_eq!(Color::from_json(&json!([1, 2, 3])), Ok(Color::rgb(1, 2, 3)));
        assert_eq!(Color::from_json(&json!([1, 2, 3, 4])).unwrap().a, 4);
        assert!(Color::from_json(&json!([1, 2])).is_err());
        assert!(Color::from_json(&json!(12)).is_err());
        assert!("chartreusey".parse::<Color>().is_err());
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#ff0010");
    }
}
