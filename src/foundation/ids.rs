use crate::foundation::error::{LessonError, LessonResult};
use std::fmt;
use std::str::FromStr;

/// Stable scene identity. Assigned by the document store and never reused.
///
/// Serialized as `"s<N>"` so it can key JSON maps.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct SceneId(pub u64);

/// Stable placed-object identity, serialized as `"o<N>"`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(pub u64);

macro_rules! prefixed_id {
    ($ty:ident, $prefix:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl FromStr for $ty {
            type Err = LessonError;

            fn from_str(s: &str) -> LessonResult<Self> {
                let digits = s.trim().strip_prefix($prefix).ok_or_else(|| {
                    LessonError::invalid_value(format!(
                        concat!("identity '{}' must start with '", $prefix, "'"),
                        s
                    ))
                })?;
                digits.parse::<u64>().map(Self).map_err(|_| {
                    LessonError::invalid_value(format!("identity '{s}' has a non-numeric suffix"))
                })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = LessonError;

            fn try_from(s: String) -> LessonResult<Self> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.to_string()
            }
        }
    };
}

prefixed_id!(SceneId, "s");
prefixed_id!(ObjectId, "o");

/// Language code such as `en`, `my` or `pt-BR`.
///
/// Primary subtag is 2-3 lowercase ASCII letters, optionally followed by `-` and an alphanumeric
/// region/script subtag.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct LangCode(String);

impl LangCode {
    pub fn new(code: impl Into<String>) -> LessonResult<Self> {
        let code = code.into();
        let (primary, rest) = match code.split_once('-') {
            Some((p, r)) => (p, Some(r)),
            None => (code.as_str(), None),
        };
        let primary_ok = (2..=3).contains(&primary.len())
            && primary.bytes().all(|b| b.is_ascii_lowercase());
        let rest_ok = rest.is_none_or(|r| {
            (1..=8).contains(&r.len()) && r.bytes().all(|b| b.is_ascii_alphanumeric())
        });
        if !primary_ok || !rest_ok {
            return Err(LessonError::invalid_value(format!(
                "'{code}' is not a language code"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LangCode {
    type Err = LessonError;

    fn from_str(s: &str) -> LessonResult<Self> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for LangCode {
    type Error = LessonError;

    fn try_from(s: String) -> LessonResult<Self> {
        Self::new(s)
    }
}

impl From<LangCode> for String {
    fn from(code: LangCode) -> Self {
        code.0
    }
}

/// Monotonic allocator shared by scenes and objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct IdAllocator {
    pub(crate) next: u64,
}

impl IdAllocator {
    pub(crate) fn scene(&mut self) -> LessonResult<SceneId> {
        self.bump().map(SceneId)
    }

    pub(crate) fn object(&mut self) -> LessonResult<ObjectId> {
        self.bump().map(ObjectId)
    }

    fn bump(&mut self) -> LessonResult<u64> {
        let id = self.next;
        self.next = id
            .checked_add(1)
            .ok_or_else(|| LessonError::duplicate(format!("identity space exhausted at {id}")))?;
        Ok(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
