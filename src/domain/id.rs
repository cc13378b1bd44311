//! Numbered names for festival elements
//!
//! Name formats:
//! - Phases: `NNN_NAME` (e.g., `001_PLAN`)
//! - Sequences: `NN_name` (e.g., `01_setup`)
//! - Tasks: `NN_name.md` (e.g., `02_write_tests.md`)
//!
//! The numeric prefix orders siblings. Phase names are uppercase, sequence
//! and task names lowercase. Whitespace in a name becomes `_`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extension carried by task files
pub const TASK_EXTENSION: &str = ".md";

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Name not recognized as a {level}: '{name}'")]
    NotRecognized { level: Level, name: String },

    #[error("Invalid element name: '{0}'")]
    InvalidName(String),

    #[error("{level} number {number} does not fit in {width} digits")]
    NumberOutOfRange { level: Level, number: u32, width: usize },
}

/// Hierarchy level of a numbered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Phase,
    Sequence,
    Task,
}

impl Level {
    /// Width of the zero-padded numeric prefix
    pub fn width(&self) -> usize {
        match self {
            Level::Phase => 3,
            Level::Sequence | Level::Task => 2,
        }
    }

    /// Highest number that fits in the prefix
    pub fn max_number(&self) -> u32 {
        10u32.pow(self.width() as u32) - 1
    }

    /// Returns true if elements at this level are files rather than directories
    pub fn is_file(&self) -> bool {
        matches!(self, Level::Task)
    }

    /// Returns the level nested directly below this one
    pub fn child(&self) -> Option<Level> {
        match self {
            Level::Phase => Some(Level::Sequence),
            Level::Sequence => Some(Level::Task),
            Level::Task => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Phase => "phase",
            Level::Sequence => "sequence",
            Level::Task => "task",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits `NN_rest` into its number and rest, requiring exactly `width` digits
fn split_prefix(s: &str, width: usize) -> Option<(u32, &str)> {
    let (digits, rest) = s.split_once('_')?;
    if digits.len() != width || !digits.bytes().all(|b| b.is_ascii_digit()) || rest.is_empty() {
        return None;
    }
    Some((digits.parse().ok()?, rest))
}

/// Normalizes a human-readable name for the given level
pub fn normalize_name(level: Level, name: &str) -> Result<String, IdError> {
    let trimmed = name.trim();
    let trimmed = match level {
        Level::Task => trimmed.strip_suffix(TASK_EXTENSION).unwrap_or(trimmed),
        _ => trimmed,
    };

    let joined = trimmed.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() || joined.starts_with('.') || joined.contains(['/', '\\']) {
        return Err(IdError::InvalidName(name.to_string()));
    }

    Ok(match level {
        Level::Phase => joined.to_uppercase(),
        Level::Sequence | Level::Task => joined.to_lowercase(),
    })
}

/// Formats the canonical directory/file name for an element
pub fn format_id(level: Level, number: u32, name: &str) -> Result<String, IdError> {
    let name = normalize_name(level, name)?;
    Ok(ElementName::new(level, number, name)?.to_string())
}

/// Extracts the numeric prefix of a name at the given level
pub fn parse_number(level: Level, name: &str) -> Result<u32, IdError> {
    ElementName::parse(level, name).map(|parsed| parsed.number)
}

/// Classifies a path by the naming pattern of its base name
///
/// The 3-digit phase pattern is checked first; a 2-digit prefix is a task
/// when the name ends in `.md` and a sequence otherwise.
pub fn classify_level(path: &Path) -> Option<Level> {
    let name = path.file_name()?.to_str()?;

    if split_prefix(name, Level::Phase.width()).is_some() {
        return Some(Level::Phase);
    }

    let (_, rest) = split_prefix(name, Level::Sequence.width())?;
    match rest.strip_suffix(TASK_EXTENSION) {
        Some(stem) if !stem.is_empty() => Some(Level::Task),
        _ => Some(Level::Sequence),
    }
}

/// A parsed element name: level, number and human-readable suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementName {
    pub level: Level,
    pub number: u32,
    /// The suffix after `NN_`, without the task extension
    pub name: String,
}

impl ElementName {
    /// Creates a name, checking that the number fits the level's width
    pub fn new(level: Level, number: u32, name: impl Into<String>) -> Result<Self, IdError> {
        if number > level.max_number() {
            return Err(IdError::NumberOutOfRange {
                level,
                number,
                width: level.width(),
            });
        }
        Ok(Self {
            level,
            number,
            name: name.into(),
        })
    }

    /// Parses a full directory/file name at the given level
    pub fn parse(level: Level, full_name: &str) -> Result<Self, IdError> {
        let not_recognized = || IdError::NotRecognized {
            level,
            name: full_name.to_string(),
        };

        let (number, rest) = split_prefix(full_name, level.width()).ok_or_else(not_recognized)?;
        let name = match level {
            Level::Task => rest
                .strip_suffix(TASK_EXTENSION)
                .filter(|stem| !stem.is_empty())
                .ok_or_else(not_recognized)?,
            Level::Phase | Level::Sequence => rest,
        };

        Ok(Self {
            level,
            number,
            name: name.to_string(),
        })
    }

    /// Returns the same element renumbered
    pub fn with_number(&self, number: u32) -> Result<Self, IdError> {
        Self::new(self.level, number, self.name.clone())
    }

    /// Returns the name without the task extension (`02_write_tests`)
    pub fn stem(&self) -> String {
        format!("{:0width$}_{}", self.number, self.name, width = self.level.width())
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem())?;
        if self.level.is_file() {
            f.write_str(TASK_EXTENSION)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_phase_id() {
        assert_eq!(format_id(Level::Phase, 2, "design").unwrap(), "002_DESIGN");
        assert_eq!(
            format_id(Level::Phase, 12, "code review").unwrap(),
            "012_CODE_REVIEW"
        );
    }

    #[test]
    fn format_sequence_and_task_ids() {
        assert_eq!(format_id(Level::Sequence, 1, "Setup").unwrap(), "01_setup");
        assert_eq!(
            format_id(Level::Task, 3, "Write Tests").unwrap(),
            "03_write_tests.md"
        );
        // A trailing extension is not doubled
        assert_eq!(format_id(Level::Task, 3, "notes.md").unwrap(), "03_notes.md");
    }

    #[test]
    fn format_rejects_bad_names() {
        assert!(matches!(
            format_id(Level::Phase, 1, "   "),
            Err(IdError::InvalidName(_))
        ));
        assert!(matches!(
            format_id(Level::Sequence, 1, "a/b"),
            Err(IdError::InvalidName(_))
        ));
        assert!(matches!(
            format_id(Level::Sequence, 1, ".hidden"),
            Err(IdError::InvalidName(_))
        ));
    }

    #[test]
    fn format_rejects_overflowing_numbers() {
        assert!(matches!(
            format_id(Level::Sequence, 100, "x"),
            Err(IdError::NumberOutOfRange { .. })
        ));
        assert!(format_id(Level::Phase, 999, "x").is_ok());
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_number(Level::Phase, "001_PLAN").unwrap(), 1);
        assert_eq!(parse_number(Level::Sequence, "12_build").unwrap(), 12);
        assert_eq!(parse_number(Level::Task, "07_write.md").unwrap(), 7);
    }

    #[test]
    fn parse_rejects_wrong_width() {
        assert!(matches!(
            parse_number(Level::Phase, "01_plan"),
            Err(IdError::NotRecognized { .. })
        ));
        assert!(matches!(
            parse_number(Level::Sequence, "001_PLAN"),
            Err(IdError::NotRecognized { .. })
        ));
        assert!(parse_number(Level::Sequence, "01_").is_err());
        assert!(parse_number(Level::Sequence, "ab_x").is_err());
        assert!(parse_number(Level::Task, "01_notes.txt").is_err());
        assert!(parse_number(Level::Task, "01_.md").is_err());
    }

    #[test]
    fn classify_levels() {
        assert_eq!(classify_level(Path::new("/f/001_PLAN")), Some(Level::Phase));
        assert_eq!(classify_level(Path::new("/f/001_PLAN/01_setup")), Some(Level::Sequence));
        assert_eq!(
            classify_level(Path::new("/f/001_PLAN/01_setup/02_init.md")),
            Some(Level::Task)
        );
        assert_eq!(classify_level(Path::new("/f/README.md")), None);
        assert_eq!(classify_level(Path::new("/f/1_x")), None);
        assert_eq!(classify_level(Path::new("/f/.fest")), None);
    }

    #[test]
    fn element_name_roundtrip_and_renumber() {
        let name = ElementName::parse(Level::Task, "02_write_tests.md").unwrap();
        assert_eq!(name.number, 2);
        assert_eq!(name.name, "write_tests");
        assert_eq!(name.stem(), "02_write_tests");

        let moved = name.with_number(3).unwrap();
        assert_eq!(moved.to_string(), "03_write_tests.md");

        let phase = ElementName::parse(Level::Phase, "999_LAST").unwrap();
        assert!(phase.with_number(1000).is_err());
    }
}
