use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of upper-case values stored in a TEXT column with a CHECK constraint.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::database::models::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::database::models::ParseEnumError {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::database::models::ParseEnumError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl $crate::validation::TextEnum for $name {
            fn accepted() -> Vec<&'static str> {
                vec![$($text),+]
            }
        }

        impl From<$name> for $crate::database::value::SqlValue {
            fn from(v: $name) -> Self {
                $crate::database::value::SqlValue::Text(Some(v.as_str().to_string()))
            }
        }

        impl From<Option<$name>> for $crate::database::value::SqlValue {
            fn from(v: Option<$name>) -> Self {
                $crate::database::value::SqlValue::Text(v.map(|v| v.as_str().to_string()))
            }
        }
    };
}

pub(crate) use text_enum;

pub mod attendance;
pub mod devotional;
pub mod event;
pub mod group;
pub mod notification;
pub mod observation;
pub mod rehearsal;
pub mod scale;
pub mod transaction;
pub mod user;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::SqlValue;
    use crate::validation::TextEnum;

    text_enum!(Color { Red => "RED", Blue => "BLUE" });

    #[test]
    fn text_enum_round_trips_through_text() {
        assert_eq!("RED".parse::<Color>().unwrap(), Color::Red);
        assert!("red".parse::<Color>().is_err());
        assert_eq!(Color::Blue.to_string(), "BLUE");
        assert_eq!(serde_json::to_value(Color::Blue).unwrap(), "BLUE");
        assert_eq!(Color::accepted(), vec!["RED", "BLUE"]);
        assert_eq!(SqlValue::from(Color::Red), SqlValue::from("RED"));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        group_id: Option<Option<uuid::Uuid>>,
    }

    #[test]
    fn nullable_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.group_id, None);
        let cleared: Patch = serde_json::from_str(r#"{"group_id":null}"#).unwrap();
        assert_eq!(cleared.group_id, Some(None));
    }
}
