use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            /// Generate a fresh identifier.
            pub fn new() -> Self {
                // Version 7 keeps identifiers sortable by creation time.
                Self(Uuid::now_v7())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a task (UUID v7).
    TaskId
);

uuid_id!(
    /// Identifier of a project (UUID v7).
    ProjectId
);

uuid_id!(
    /// Identifier of an activity record (UUID v7).
    ActivityId
);

/// Identifier of the user owning projects, tasks and activities.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw user identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_uses_uuid_v7() {
        let id = TaskId::new();
        assert_eq!(id.0.get_version_num(), 7);
    }

    #[test]
    fn project_id_parses_with_surrounding_whitespace() {
        let uuid = Uuid::now_v7();
        let parsed: ProjectId = format!("  {uuid}\n")
            .parse()
            .unwrap_or_else(|err| panic!("must parse project id: {err}"));
        assert_eq!(parsed.0, uuid);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ActivityId::new();
        let json = serde_json::to_string(&id).unwrap_or_else(|err| panic!("must serialize: {err}"));
        assert_eq!(json, format!("\"{id}\""));

        let user = UserId::from("alice");
        let json = serde_json::to_string(&user).unwrap_or_else(|err| panic!("must serialize: {err}"));
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn invalid_id_is_rejected() {
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }
}
