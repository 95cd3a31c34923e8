//! Boards and the two sheet kinds uploaded for each of them

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which of a board's two sheets a table is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Failure mode, effects and criticality analysis sheet
    Fmeca,
    /// Test coverage sheet (candidate designators + verdicts)
    Coverage,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Fmeca => "fmeca",
            TableKind::Coverage => "coverage",
        }
    }

    /// Human label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Fmeca => "FMECA",
            TableKind::Coverage => "coverage",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fmeca" => Ok(TableKind::Fmeca),
            "coverage" => Ok(TableKind::Coverage),
            _ => Err(format!("file type must be 'fmeca' or 'coverage', got '{}'", s)),
        }
    }
}

/// Board metadata as stored in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Board listing entry with upload availability
#[derive(Debug, Clone, Serialize)]
pub struct BoardInfo {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub has_fmeca: bool,
    pub has_coverage: bool,
    pub has_image: bool,
}

/// Which sheets and image a board has
#[derive(Debug, Clone, Serialize)]
pub struct BoardFiles {
    pub board_id: i64,
    pub board_name: String,
    pub fmeca_exists: bool,
    pub coverage_exists: bool,
    pub image_exists: bool,
}

/// How a board is referred to on the command line: numeric id or name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardSelector {
    Id(i64),
    Name(String),
}

impl BoardSelector {
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(id) => BoardSelector::Id(id),
            Err(_) => BoardSelector::Name(s.trim().to_string()),
        }
    }
}

impl std::fmt::Display for BoardSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardSelector::Id(id) => write!(f, "{}", id),
            BoardSelector::Name(name) => write!(f, "{}", name),
        }
    }
}
