use std::fmt;
use std::str::FromStr;

/// Sentinel for a numeric filename field that was absent or failed to parse.
pub const UNRESOLVED: i32 = -1;

/// Which filename grammar a take's name matched.
///
/// Current names look like `en_ulb_b41_mrk_c01_v01-05_t02.wav`; legacy names
/// (recorder versions before 8.5) look like `en_ulb_mrk_01-01_02.wav`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grammar {
    Current,
    Legacy,
}

/// Fields extracted from a take's filename.
///
/// When `matched` is false none of the other fields are meaningful; the
/// struct is still returned default-populated so callers can branch on
/// `matched` instead of handling an error.
#[derive(Clone, Debug)]
pub struct TakeIdentity {
    pub language: String,
    /// Source text / version slug (`ulb`, `udb`, `reg`, ...).
    pub source: String,
    /// Book slug (`gen`, `mrk`, `1jn`, ...). Empty for `obs` takes.
    pub book: String,
    pub book_number: i32,
    pub chapter: i32,
    pub start_verse: i32,
    pub end_verse: i32,
    pub take: i32,
    pub grammar: Grammar,
    pub matched: bool,
}

impl Default for TakeIdentity {
    fn default() -> Self {
        TakeIdentity {
            language: String::new(),
            source: String::new(),
            book: String::new(),
            book_number: UNRESOLVED,
            chapter: UNRESOLVED,
            start_verse: UNRESOLVED,
            end_verse: UNRESOLVED,
            take: UNRESOLVED,
            grammar: Grammar::Current,
            matched: false,
        }
    }
}

/// Recording mode of a take: one verse per take, or one translation chunk
/// (a run of consecutive verses) per take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Verse,
    Chunk,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Verse => "verse",
            Mode::Chunk => "chunk",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verse" => Ok(Mode::Verse),
            "chunk" => Ok(Mode::Chunk),
            other => Err(format!("unknown mode '{other}' (expected verse or chunk)")),
        }
    }
}

/// One language/version/book grouping of takes, used to batch decisions
/// (which mode to stamp, whether anything needs fixing) across the takes
/// that share an identity.
#[derive(Clone, Debug)]
pub struct Project {
    pub mode: Option<Mode>,
    pub language: String,
    pub version: String,
    pub book: String,
    /// At least one take under this project has incomplete metadata.
    pub should_fix: bool,
    /// The caller changed this project's mode; all takes get restamped.
    pub should_update: bool,
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.language, self.version, self.book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("verse".parse::<Mode>().unwrap(), Mode::Verse);
        assert_eq!("Chunk".parse::<Mode>().unwrap(), Mode::Chunk);
        assert!("verses".parse::<Mode>().is_err());
    }

    #[test]
    fn test_unmatched_identity_is_default() {
        let id = TakeIdentity::default();
        assert!(!id.matched);
        assert_eq!(id.take, UNRESOLVED);
        assert_eq!(id.end_verse, UNRESOLVED);
    }
}
