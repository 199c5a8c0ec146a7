use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Category a technology stack belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackGroup {
    Language,
    Framework,
    Library,
    Database,
    Devops,
    Tool,
    #[default]
    Etc,
}

impl StackGroup {
    pub const ALL: [StackGroup; 7] = [
        StackGroup::Language,
        StackGroup::Framework,
        StackGroup::Library,
        StackGroup::Database,
        StackGroup::Devops,
        StackGroup::Tool,
        StackGroup::Etc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StackGroup::Language => "language",
            StackGroup::Framework => "framework",
            StackGroup::Library => "library",
            StackGroup::Database => "database",
            StackGroup::Devops => "devops",
            StackGroup::Tool => "tool",
            StackGroup::Etc => "etc",
        }
    }
}

impl fmt::Display for StackGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StackGroup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StackGroup::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown stack group: {s}")))
    }
}

/// A curated technology that posts can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: i64,
    pub name: String,
    pub group: StackGroup,
}

/// A stack with the number of published posts using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackWithCount {
    pub id: i64,
    pub name: String,
    pub group: StackGroup,
    pub post_count: i64,
}
