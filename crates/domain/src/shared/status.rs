use std::fmt::{Debug, Display};
use std::str::FromStr;
use thiserror::Error;

/// A move between two statuses that is not in the transition table of the entity
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid {entity} transition from `{from}` to `{to}`")]
pub struct InvalidTransition {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown {entity} status: `{value}`")]
pub struct UnknownStatus {
    pub entity: &'static str,
    pub value: String,
}

/// Status enum of an entity with an explicit table of allowed transitions.
/// Anything not listed in `next` is rejected.
pub trait Status: Copy + PartialEq + Debug + Display + FromStr + 'static {
    const ENTITY: &'static str;

    /// The statuses that can directly follow `self`
    fn next(&self) -> &'static [Self];

    fn as_str(&self) -> &'static str;

    fn can_transition_to(&self, to: Self) -> bool {
        self.next().contains(&to)
    }

    fn is_terminal(&self) -> bool {
        self.next().is_empty()
    }

    fn transition(self, to: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Whether `target` can be reached from `self` through one or more transitions
    fn can_reach(&self, target: Self) -> bool {
        let mut visited: Vec<Self> = vec![*self];
        let mut frontier: Vec<Self> = vec![*self];
        while let Some(status) = frontier.pop() {
            for next in status.next() {
                if *next == target {
                    return true;
                }
                if !visited.contains(next) {
                    visited.push(*next);
                    frontier.push(*next);
                }
            }
        }
        false
    }
}

/// Implements `Display`, `FromStr` and serde for a status enum through its `as_str`
/// representation and the given list of variants.
#[macro_export]
macro_rules! status_strings {
    ($status:ty, [$($variant:path),+ $(,)?]) => {
        impl std::fmt::Display for $status {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", $crate::Status::as_str(self))
            }
        }

        impl std::str::FromStr for $status {
            type Err = $crate::UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if $crate::Status::as_str(&$variant) == s {
                        return Ok($variant);
                    }
                )+
                Err($crate::UnknownStatus {
                    entity: <$status as $crate::Status>::ENTITY,
                    value: s.to_string(),
                })
            }
        }

        impl serde::Serialize for $status {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::Status::as_str(self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $status {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}
