//! Line search over a session's accumulated buffers.
//!
//! This is a pure read path: it never mutates the buffers, and repeated
//! calls with identical inputs against an unchanged session produce
//! identical results.

use regex::RegexBuilder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use shell_mcp_core::{config::LimitSettings, validate_pattern, Error, Result};

/// Which buffer a matched line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Which buffer(s) a search runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    /// Search stdout only
    Stdout,
    /// Search stderr only
    Stderr,
    /// Search both buffers
    #[default]
    Both,
}

impl SearchTarget {
    /// Parse a target selector string (`stdout`, `stderr` or `both`).
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "both" => Ok(Self::Both),
            other => Err(Error::InvalidPattern(format!(
                "invalid search target '{other}' (expected stdout, stderr or both)"
            ))),
        }
    }
}

/// One matched line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchMatch {
    /// Buffer the line came from
    pub stream: StreamKind,
    /// 1-based line number within that buffer
    pub line_number: usize,
    /// The matched line, trimmed
    pub line: String,
}

enum Matcher {
    Literal { needle: String, case_sensitive: bool },
    Pattern(regex::Regex),
}

impl Matcher {
    fn build(pattern: &str, is_regex: bool, case_sensitive: bool) -> Result<Self> {
        if is_regex {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| Error::PatternSyntax(e.to_string()))?;
            Ok(Self::Pattern(re))
        } else {
            let needle = if case_sensitive {
                pattern.to_string()
            } else {
                pattern.to_lowercase()
            };
            Ok(Self::Literal {
                needle,
                case_sensitive,
            })
        }
    }

    fn matches(&self, line: &str) -> bool {
        match self {
            Self::Literal {
                needle,
                case_sensitive,
            } => {
                if *case_sensitive {
                    line.contains(needle.as_str())
                } else {
                    line.to_lowercase().contains(needle.as_str())
                }
            }
            Self::Pattern(re) => re.is_match(line),
        }
    }
}

/// Search the selected buffer(s) line by line.
///
/// Each line is evaluated independently against the pattern; matches carry
/// the 1-based line number and the trimmed line text. The match count the
/// caller reports is `matches.len()` by definition.
pub fn search_buffers(
    stdout: &str,
    stderr: &str,
    pattern: &str,
    is_regex: bool,
    case_sensitive: bool,
    target: SearchTarget,
    limits: &LimitSettings,
) -> Result<Vec<SearchMatch>> {
    validate_pattern(pattern, is_regex, limits)?;
    let matcher = Matcher::build(pattern, is_regex, case_sensitive)?;

    let mut matches = Vec::new();
    if matches!(target, SearchTarget::Stdout | SearchTarget::Both) {
        scan(stdout, StreamKind::Stdout, &matcher, &mut matches);
    }
    if matches!(target, SearchTarget::Stderr | SearchTarget::Both) {
        scan(stderr, StreamKind::Stderr, &matcher, &mut matches);
    }
    Ok(matches)
}

fn scan(buffer: &str, stream: StreamKind, matcher: &Matcher, out: &mut Vec<SearchMatch>) {
    for (index, line) in buffer.lines().enumerate() {
        if matcher.matches(line) {
            out.push(SearchMatch {
                stream,
                line_number: index + 1,
                line: line.trim().to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits() -> LimitSettings {
        LimitSettings::default()
    }

    const STDOUT: &str = "starting up\nERROR: disk full\nretrying\nerror: still full\ndone\n";
    const STDERR: &str = "warning: low memory\nERROR: crashed\n";

    #[test]
    fn test_literal_case_sensitive() {
        let matches =
            search_buffers(STDOUT, STDERR, "ERROR", false, true, SearchTarget::Both, &limits())
                .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].stream, StreamKind::Stdout);
        assert_eq!(matches[0].line_number, 2);
        assert_eq!(matches[0].line, "ERROR: disk full");
        assert_eq!(matches[1].stream, StreamKind::Stderr);
        assert_eq!(matches[1].line_number, 2);
    }

    #[test]
    fn test_literal_case_insensitive_finds_more() {
        let sensitive =
            search_buffers(STDOUT, STDERR, "ERROR", false, true, SearchTarget::Both, &limits())
                .unwrap();
        let insensitive =
            search_buffers(STDOUT, STDERR, "ERROR", false, false, SearchTarget::Both, &limits())
                .unwrap();
        assert!(insensitive.len() >= sensitive.len());
        assert_eq!(insensitive.len(), 3);
    }

    #[test]
    fn test_target_selection() {
        let stdout_only =
            search_buffers(STDOUT, STDERR, "ERROR", false, true, SearchTarget::Stdout, &limits())
                .unwrap();
        assert_eq!(stdout_only.len(), 1);
        assert_eq!(stdout_only[0].stream, StreamKind::Stdout);

        let stderr_only =
            search_buffers(STDOUT, STDERR, "ERROR", false, true, SearchTarget::Stderr, &limits())
                .unwrap();
        assert_eq!(stderr_only.len(), 1);
        assert_eq!(stderr_only[0].stream, StreamKind::Stderr);
    }

    #[test]
    fn test_regex_mode() {
        let matches = search_buffers(
            STDOUT,
            STDERR,
            r"(?i)^error\b",
            true,
            true,
            SearchTarget::Stdout,
            &limits(),
        )
        .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line_number, 2);
        assert_eq!(matches[1].line_number, 4);
    }

    #[test]
    fn test_regex_case_insensitive_flag() {
        let matches = search_buffers(
            STDOUT,
            "",
            "^error",
            true,
            false,
            SearchTarget::Stdout,
            &limits(),
        )
        .unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_matched_lines_are_trimmed() {
        let matches = search_buffers(
            "  indented ERROR line  \n",
            "",
            "ERROR",
            false,
            true,
            SearchTarget::Stdout,
            &limits(),
        )
        .unwrap();
        assert_eq!(matches[0].line, "indented ERROR line");
    }

    #[test]
    fn test_bad_regex_is_a_rejection() {
        let err = search_buffers(
            STDOUT,
            STDERR,
            "([unclosed",
            true,
            true,
            SearchTarget::Both,
            &limits(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PatternSyntax(_)));
    }

    #[test]
    fn test_empty_pattern_is_a_rejection() {
        let err =
            search_buffers(STDOUT, STDERR, "", false, true, SearchTarget::Both, &limits())
                .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern(_)));
    }

    #[test]
    fn test_no_matches_is_ok_and_empty() {
        let matches = search_buffers(
            STDOUT,
            STDERR,
            "nothing-here",
            false,
            true,
            SearchTarget::Both,
            &limits(),
        )
        .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let a = search_buffers(STDOUT, STDERR, "err", false, false, SearchTarget::Both, &limits())
            .unwrap();
        let b = search_buffers(STDOUT, STDERR, "err", false, false, SearchTarget::Both, &limits())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(SearchTarget::parse("stdout").unwrap(), SearchTarget::Stdout);
        assert_eq!(SearchTarget::parse("stderr").unwrap(), SearchTarget::Stderr);
        assert_eq!(SearchTarget::parse("both").unwrap(), SearchTarget::Both);
        assert!(SearchTarget::parse("all").is_err());
    }

    proptest! {
        /// Case-insensitive literal search never finds fewer lines than
        /// case-sensitive search over the same buffers.
        #[test]
        fn prop_insensitive_superset(
            buffer in "(?s)[ -~\n]{0,400}",
            needle in "[ -~]{1,10}",
        ) {
            let sensitive = search_buffers(
                &buffer, "", &needle, false, true, SearchTarget::Stdout, &limits(),
            ).unwrap();
            let insensitive = search_buffers(
                &buffer, "", &needle, false, false, SearchTarget::Stdout, &limits(),
            ).unwrap();
            prop_assert!(insensitive.len() >= sensitive.len());
        }

        /// Line numbers are 1-based and monotonically increasing per stream.
        #[test]
        fn prop_line_numbers_monotonic(buffer in "(?s)[a-z\n]{0,200}") {
            let matches = search_buffers(
                &buffer, "", "a", false, true, SearchTarget::Stdout, &limits(),
            ).unwrap();
            let mut last = 0;
            for m in &matches {
                prop_assert!(m.line_number > last);
                last = m.line_number;
            }
        }
    }
}
