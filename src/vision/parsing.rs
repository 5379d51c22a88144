use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

/// Macro estimate for one serving, as returned to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroEstimate {
    #[serde(default, deserialize_with = "lenient_number", serialize_with = "whole_as_integer")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_number", serialize_with = "whole_as_integer")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_number", serialize_with = "whole_as_integer")]
    pub fats: f64,
    #[serde(default, deserialize_with = "lenient_number", serialize_with = "whole_as_integer")]
    pub carbs: f64,
}

/// Parsed estimate plus whether it is a zeroed stand-in for unreadable output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroAnalysis {
    pub macros: MacroEstimate,
    pub degraded: bool,
}

/// Accepts `42`, `42.5` and `"42 g"` style values.
fn lenient_number<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    lazy_static! {
        static ref NUMBER_RE: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
    }
    match Raw::deserialize(de)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => NUMBER_RE
            .find(&s)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| serde::de::Error::custom(format!("not a number: {s}"))),
    }
}

/// Writes `450.0` as `450` so whole estimates reach the client as the model gave them.
fn whole_as_integer<S: Serializer>(n: &f64, ser: S) -> Result<S::Ok, S::Error> {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if n.fract() == 0.0 && n.abs() < EXACT {
        ser.serialize_i64(*n as i64)
    } else {
        ser.serialize_f64(*n)
    }
}

pub fn parse_ingredients(text: &str) -> Vec<String> {
    text.split(',')
        .map(|item| item.trim().trim_end_matches('.').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads `{calories, protein, fats, carbs}` out of free model text. Falls back to
/// zeroes with `degraded` set when no JSON object can be parsed.
pub fn extract_macros(text: &str) -> MacroAnalysis {
    lazy_static! {
        static ref JSON_BLOCK_RE: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
    }

    let candidate = match JSON_BLOCK_RE.find(text) {
        Some(m) => m.as_str(),
        None => {
            warn!(response = %preview(text), "no JSON object in model output; parsing whole text");
            text.trim()
        }
    };

    match serde_json::from_str::<MacroEstimate>(candidate) {
        Ok(macros) => {
            info!(?macros, "macros identified");
            MacroAnalysis {
                macros,
                degraded: false,
            }
        }
        Err(e) => {
            warn!(error = %e, response = %preview(text), "unparseable macro output; using zeroes");
            MacroAnalysis {
                macros: MacroEstimate::default(),
                degraded: true,
            }
        }
    }
}

pub(crate) fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
