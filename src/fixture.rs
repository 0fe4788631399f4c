//! Test fixture parsing
//!
//! A fixture is a short whitespace-separated text:
//!
//! ```text
//! timeout 10        <- optional, whole line skipped
//! tiled             <- mode: id_x_b | a_x_id | uniform | ternary | tiled
//! 64 64 64 16       <- m n k, plus tile_size for tiled only
//! ```
//!
//! Nothing may follow the last expected field.

use std::path::Path;
use std::str::FromStr;

use crate::generator::InputMode;
use crate::{I8mmError, Problem, Result};

/// Parsed fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixture {
    /// How operands are generated
    pub mode: InputMode,
    /// Rows of `A` and `C`
    pub m: usize,
    /// Columns of `B` and `C`
    pub n: usize,
    /// Reduction dimension
    pub k: usize,
    /// Tile size, present only for `tiled`
    pub tile_size: Option<usize>,
}

impl Fixture {
    /// Reads and parses a fixture file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise the errors of
    /// [`Fixture::parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses fixture text
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` for an unrecognized mode token and
    /// `MalformedFixture` for missing, non-numeric, zero or trailing fields.
    ///
    /// # Example
    ///
    /// ```
    /// use i8mm::{fixture::Fixture, generator::InputMode};
    ///
    /// let f = Fixture::parse("timeout 5\nuniform\n2 3 4\n").unwrap();
    /// assert_eq!(f.mode, InputMode::Uniform);
    /// assert_eq!((f.m, f.n, f.k, f.tile_size), (2, 3, 4, None));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let body = skip_timeout_line(text);
        let mut tokens = body.split_whitespace();

        let mode: InputMode = tokens
            .next()
            .ok_or_else(|| I8mmError::MalformedFixture("missing input mode".to_string()))?
            .parse()?;

        let mut field = |name: &str| -> Result<usize> {
            let token = tokens
                .next()
                .ok_or_else(|| I8mmError::MalformedFixture(format!("missing {name}")))?;
            match token.parse::<usize>() {
                Ok(0) => Err(I8mmError::MalformedFixture(format!("{name} must be positive"))),
                Ok(v) => Ok(v),
                Err(_) => Err(I8mmError::MalformedFixture(format!(
                    "{name} is not a non-negative integer: {token:?}"
                ))),
            }
        };

        let m = field("m")?;
        let n = field("n")?;
        let k = field("k")?;
        let tile_size = if mode.needs_tile_size() {
            Some(field("tile_size")?)
        } else {
            None
        };

        if let Some(extra) = tokens.next() {
            return Err(I8mmError::MalformedFixture(format!(
                "unexpected trailing token {extra:?}"
            )));
        }

        Ok(Self {
            mode,
            m,
            n,
            k,
            tile_size,
        })
    }

    /// Generates the problem this fixture describes
    ///
    /// # Panics
    ///
    /// Panics on the shape preconditions of [`InputMode::build`].
    pub fn build(&self) -> Problem {
        self.mode.build(self.m, self.n, self.k, self.tile_size)
    }
}

impl FromStr for Fixture {
    type Err = I8mmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Drops a leading `timeout ...` line, if present
fn skip_timeout_line(text: &str) -> &str {
    let trimmed = text.trim_start();
    let first_token = trimmed.split_whitespace().next();
    if first_token != Some("timeout") {
        return trimmed;
    }
    match trimmed.find('\n') {
        Some(end) => &trimmed[end + 1..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regular() {
        let f = Fixture::parse("ternary 10 20 30").unwrap();
        assert_eq!(f.mode, InputMode::Ternary);
        assert_eq!((f.m, f.n, f.k), (10, 20, 30));
        assert_eq!(f.tile_size, None);
    }

    #[test]
    fn test_parse_tiled() {
        let f = Fixture::parse("tiled\n64 32 16 8\n").unwrap();
        assert_eq!(f.mode, InputMode::Tiled);
        assert_eq!(f.tile_size, Some(8));
    }

    #[test]
    fn test_timeout_line_skipped() {
        let f = Fixture::parse("timeout 3.5 extra words\nid_x_b\n4 4 4\n").unwrap();
        assert_eq!(f.mode, InputMode::IdentityTimesB);
    }

    #[test]
    fn test_timeout_only_is_malformed() {
        let err = Fixture::parse("timeout 10").unwrap_err();
        assert!(matches!(err, I8mmError::MalformedFixture(_)));
    }

    #[test]
    fn test_unknown_mode() {
        let err = Fixture::parse("sparse 1 2 3").unwrap_err();
        assert!(matches!(err, I8mmError::UnknownMode(ref s) if s == "sparse"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_missing_field() {
        let err = Fixture::parse("uniform 1 2").unwrap_err();
        assert!(err.to_string().contains("missing k"));
    }

    #[test]
    fn test_tiled_missing_tile_size() {
        let err = Fixture::parse("tiled 8 8 8").unwrap_err();
        assert!(err.to_string().contains("missing tile_size"));
    }

    #[test]
    fn test_trailing_token_rejected() {
        let err = Fixture::parse("uniform 1 2 3 4").unwrap_err();
        assert!(err.to_string().contains("trailing"));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(Fixture::parse("uniform 1 two 3").is_err());
        assert!(Fixture::parse("uniform 1 -2 3").is_err());
        assert!(Fixture::parse("uniform 0 2 3").is_err());
    }

    #[test]
    fn test_build_matches_mode() {
        let f: Fixture = "a_x_id 3 5 5".parse().unwrap();
        let p = f.build();
        assert_eq!((p.m(), p.n(), p.k()), (3, 5, 5));
        assert_eq!(p.tile_size(), None);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Fixture::from_path("/nonexistent/i8mm/fixture.txt").unwrap_err();
        assert!(matches!(err, I8mmError::Io(_)));
    }
}
