use std::borrow::Cow;

use crate::error::LiteralError;

pub enum Whitespace {
    Preserve,
    Replace,
    Collapse,
}

pub fn normalized_value(value: &str, whitespace: Whitespace) -> Cow<str> {
    match whitespace {
        Whitespace::Preserve => Cow::Borrowed(value),
        Whitespace::Replace => {
            if value.contains(['\t', '\n', '\r']) {
                Cow::Owned(value.replace(['\t', '\n', '\r'], " "))
            } else {
                Cow::Borrowed(value)
            }
        }
        Whitespace::Collapse => {
            let trimmed = value.trim_matches(is_xml_space);
            let already_collapsed =
                !trimmed.contains(['\t', '\n', '\r']) && !trimmed.contains("  ");
            if already_collapsed {
                Cow::Borrowed(trimmed)
            } else {
                Cow::Owned(
                    trimmed
                        .split(is_xml_space)
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            }
        }
    }
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// A built-in atomic type that generated loaders read from attribute values and element text.
pub trait Literal: Sized {
    const TYPE_NAME: &'static str;

    /// Maps a whitespace-collapsed literal to a value.
    fn from_literal(normalized: &str) -> Option<Self>;
}

macro_rules! integer_literal {
    ($($ty:ty),*) => {
        $(
            impl Literal for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
                fn from_literal(normalized: &str) -> Option<Self> {
                    normalized.parse().ok()
                }
            }
        )*
    };
}

integer_literal!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! float_literal {
    ($($ty:ident),*) => {
        $(
            impl Literal for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
                fn from_literal(normalized: &str) -> Option<Self> {
                    match normalized {
                        "INF" | "+INF" => Some($ty::INFINITY),
                        "-INF" => Some($ty::NEG_INFINITY),
                        "NaN" => Some($ty::NAN),
                        // Rust also accepts spellings like "inf" and "infinity"
                        s if s
                            .bytes()
                            .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') =>
                        {
                            None
                        }
                        s => s.parse().ok(),
                    }
                }
            }
        )*
    };
}

float_literal!(f32, f64);

impl Literal for bool {
    const TYPE_NAME: &'static str = "bool";
    fn from_literal(normalized: &str) -> Option<Self> {
        match normalized {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

/// Parses an attribute value or element text as a built-in atomic type.
pub fn parse_literal<T: Literal>(value: &str) -> Result<T, LiteralError> {
    let normalized = normalized_value(value, Whitespace::Collapse);
    T::from_literal(&normalized).ok_or_else(|| LiteralError::Invalid {
        type_name: T::TYPE_NAME,
        value: value.to_string(),
    })
}
