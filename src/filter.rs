//! Path-matching filters shared by the CLI commands.
//!
//! Three modes: fuzzy (relevance-scored, results re-ranked), glob (full path
//! or basename), and regex (substring search). Case sensitivity follows the
//! smart-case convention unless explicitly overridden.

use clap::ValueEnum;
use globset::{GlobBuilder, GlobMatcher};
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use regex::{Regex, RegexBuilder};

use crate::error::{Result, SalvageError};
use crate::model::FileIndex;

/// Available search/filter modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SearchMode {
    /// Shell-style wildcards, matched against the full path or the basename.
    #[default]
    Glob,
    /// Regular-expression substring search.
    Regex,
    /// Fuzzy matching with relevance scoring.
    Fuzzy,
}

/// Determine case sensitivity using the smart-case convention.
///
/// Case-sensitive iff the pattern contains an uppercase character; an
/// explicit override takes precedence.
#[must_use]
pub fn smart_case_sensitive(pattern: &str, explicit_override: Option<bool>) -> bool {
    explicit_override.unwrap_or_else(|| pattern.chars().any(char::is_uppercase))
}

/// Score how well `path` matches `pattern` under the given mode.
///
/// Fuzzy returns a relevance score, glob and regex return 1.0; 0.0 always
/// means no match. Invalid regex patterns score 0.0 here — use
/// [`validate_regex`] to surface the compile error to the user.
#[must_use]
pub fn match_path(path: &str, pattern: &str, mode: SearchMode, case_sensitive: bool) -> f64 {
    if pattern.is_empty() {
        return 1.0;
    }
    match mode {
        SearchMode::Fuzzy => FuzzyScorer::new(pattern, case_sensitive).score(path),
        SearchMode::Glob => match build_glob(pattern, case_sensitive) {
            Some(glob) => {
                if glob_matches(&glob, path) {
                    1.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        },
        SearchMode::Regex => match build_regex(pattern, case_sensitive) {
            Ok(re) => {
                if re.is_match(path) {
                    1.0
                } else {
                    0.0
                }
            }
            Err(_) => 0.0,
        },
    }
}

/// Return an error if `pattern` is not a valid regex.
pub fn validate_regex(pattern: &str) -> Result<()> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| SalvageError::bad_regex(pattern, e.to_string()))
}

/// Filter a file index by pattern, mode, and case override.
///
/// Glob and regex preserve the index order; fuzzy results are re-ranked by
/// descending score (ties broken by path for determinism). An empty pattern
/// matches everything.
#[must_use]
pub fn filter_files(
    files: &FileIndex,
    pattern: &str,
    mode: SearchMode,
    case_override: Option<bool>,
) -> FileIndex {
    if pattern.is_empty() {
        return files.clone();
    }
    let case_sensitive = smart_case_sensitive(pattern, case_override);

    if mode == SearchMode::Fuzzy {
        let mut scorer = FuzzyScorer::new(pattern, case_sensitive);
        let mut scored: Vec<(f64, &String)> = files
            .keys()
            .filter_map(|path| {
                let score = scorer.score(path);
                (score > 0.0).then_some((score, path))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        return scored
            .into_iter()
            .filter_map(|(_, path)| files.get(path).map(|tl| (path.clone(), tl.clone())))
            .collect();
    }

    files
        .iter()
        .filter(|(path, _)| match_path(path, pattern, mode, case_sensitive) > 0.0)
        .map(|(path, tl)| (path.clone(), tl.clone()))
        .collect()
}

/// Reusable fuzzy scorer so index-wide filtering compiles the pattern once.
struct FuzzyScorer {
    pattern: Pattern,
    matcher: Matcher,
    buf: Vec<char>,
}

impl FuzzyScorer {
    fn new(pattern: &str, case_sensitive: bool) -> Self {
        let case = if case_sensitive {
            CaseMatching::Respect
        } else {
            CaseMatching::Ignore
        };
        Self {
            pattern: Pattern::new(pattern, case, Normalization::Smart, AtomKind::Fuzzy),
            matcher: Matcher::new(Config::DEFAULT.match_paths()),
            buf: Vec::new(),
        }
    }

    fn score(&mut self, path: &str) -> f64 {
        self.pattern
            .score(Utf32Str::new(path, &mut self.buf), &mut self.matcher)
            .map_or(0.0, f64::from)
    }
}

fn build_glob(pattern: &str, case_sensitive: bool) -> Option<GlobMatcher> {
    GlobBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
        .map(|g| g.compile_matcher())
}

fn glob_matches(glob: &GlobMatcher, path: &str) -> bool {
    let basename = path.rsplit('/').next().unwrap_or(path);
    glob.is_match(path) || glob.is_match(basename)
}

fn build_regex(pattern: &str, case_sensitive: bool) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
}
