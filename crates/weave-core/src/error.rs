use thiserror::Error;

/// Why a [`Scope::try_set`](crate::Scope::try_set) could not write a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    EmptyPath,
    #[error("empty segment in `{0}`")]
    EmptySegment(String),
    /// An existing intermediate value along the path is not a map.
    #[error("`{segment}` in `{path}` is not a container")]
    NotAContainer { path: String, segment: String },
}

/// Why a [`Value`](crate::Value) could not be converted to a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("cannot convert {found} to {target}")]
    Mismatch {
        found: &'static str,
        target: &'static str,
    },
    #[error("value out of range for {target}")]
    OutOfRange { target: &'static str },
}

impl CoerceError {
    pub(crate) fn mismatch(found: &crate::Value, target: &'static str) -> Self {
        CoerceError::Mismatch {
            found: found.type_name(),
            target,
        }
    }
}
