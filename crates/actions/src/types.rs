//! Shared value types for guarded actions.
//!
//! [`ActionResult`] is the tagged outcome every guarded invocation produces on
//! its non-exceptional path. On the wire it is rendered as the flat envelope
//! `{ "data": ..., "error": "...", "fieldErrors": { ... } }` that browser-side
//! code expects; the envelope exists only in serialized form.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::Role;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The caller's session as reported by the session endpoint.
///
/// Fetched fresh for every invocation; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Whether the endpoint recognised the caller.
    pub authenticated: bool,

    /// Role of the caller. An absent, `null` or empty role is `None`.
    #[serde(default, deserialize_with = "deserialize_role")]
    pub role: Option<Role>,
}

impl Session {
    /// An unauthenticated session.
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: None,
        }
    }

    /// An authenticated session carrying `role`.
    pub fn with_role(role: Role) -> Self {
        Self {
            authenticated: true,
            role: Some(role),
        }
    }
}

fn deserialize_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(Role::new))
}

// ---------------------------------------------------------------------------
// Action results
// ---------------------------------------------------------------------------

/// Validation messages keyed by dot-joined field path (e.g. `"author.name"`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Outcome of a guarded invocation that did not fail exceptionally.
///
/// A handler with nothing to return uses `ActionResult<()>`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<T> {
    /// The handler completed and produced `T`.
    Success(T),

    /// The input was rejected by the schema.
    ValidationFailure {
        /// Every issue, grouped by field path.
        field_errors: FieldErrors,
        /// One-line summary of the first issue.
        message: String,
    },

    /// Authentication, authorization, presence or business failure.
    Failure {
        /// User-facing description.
        message: String,
    },
}

impl<T> ActionResult<T> {
    /// Creates a [`ActionResult::Failure`].
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Returns `true` for [`ActionResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error message carried by either failure variant.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::ValidationFailure { message, .. } | Self::Failure { message } => Some(message),
        }
    }

    /// The field errors of a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::ValidationFailure { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    /// Returns the success payload, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Maps the success payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            Self::Success(data) => ActionResult::Success(f(data)),
            Self::ValidationFailure {
                field_errors,
                message,
            } => ActionResult::ValidationFailure {
                field_errors,
                message,
            },
            Self::Failure { message } => ActionResult::Failure { message },
        }
    }
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a, T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<&'a FieldErrors>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    data: Option<T>,
    error: Option<String>,
    field_errors: Option<FieldErrors>,
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Success(data) => EnvelopeRef {
                data: Some(data),
                error: None,
                field_errors: None,
            },
            Self::ValidationFailure {
                field_errors,
                message,
            } => EnvelopeRef {
                data: None,
                error: Some(message),
                field_errors: Some(field_errors),
            },
            Self::Failure { message } => EnvelopeRef {
                data: None,
                error: Some(message),
                field_errors: None,
            },
        };
        envelope.serialize(serializer)
    }
}

/// Decodes the flat envelope.
///
/// `error` with `fieldErrors` is a validation failure, `error` alone a
/// failure, anything else a success. A success without `data` (the "void"
/// outcome) decodes only into payload types that accept a unit value, such
/// as `()` or `Option<_>`.
impl<'de, T: DeserializeOwned> Deserialize<'de> for ActionResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = Envelope::<T>::deserialize(deserializer)?;
        match (envelope.error, envelope.field_errors) {
            (Some(message), Some(field_errors)) => Ok(Self::ValidationFailure {
                field_errors,
                message,
            }),
            (Some(message), None) => Ok(Self::Failure { message }),
            (None, _) => match envelope.data {
                Some(data) => Ok(Self::Success(data)),
                None => {
                    let unit = serde::de::value::UnitDeserializer::<D::Error>::new();
                    T::deserialize(unit).map(Self::Success)
                }
            },
        }
    }
}
