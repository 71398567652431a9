use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 动作标签
///
/// Label returned by a node's `post` phase and used to pick the outgoing
/// edge. Labels compare exactly; there is no wildcard matching.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Sentinel used when a node has nothing more specific to say.
    pub const DEFAULT: &'static str = "default";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for Action {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Action {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for Action {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl Borrow<str> for Action {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Action {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Action {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
