//! Version parsing and dependency range checking.
//!
//! Dependency ranges come from `package.json`, so they follow the npm range
//! grammar:
//!
//! - a range is one or more comparator sets joined by `||`; any set may match
//! - a set is comparators separated by whitespace or commas; all must match
//! - `A - B` is an inclusive hyphen range
//! - comparators are `>=`, `>`, `<=`, `<`, `=`, `==`, `!=`, `^` and `~`
//!   followed by a full or partial version
//! - a bare partial version is an X-range: `1.2` and `1.2.x` both mean
//!   `>=1.2.0 <1.3.0`, `*` matches anything
//!
//! # Examples
//!
//! ```
//! use extman_registry::version::VersionConstraint;
//!
//! let constraint = VersionConstraint::parse(">=1.2 <2").unwrap();
//! assert!(constraint.satisfies("1.9.3"));
//! assert!(!constraint.satisfies("2.0.0"));
//!
//! let either = VersionConstraint::parse("^1.2 || 3.x").unwrap();
//! assert!(either.satisfies("1.4.0"));
//! assert!(either.satisfies("3.0.7"));
//! assert!(!either.satisfies("2.0.0"));
//! ```

use semver::Version;

use crate::error::{Error, Result};

/// Parse a record or candidate version strictly.
///
/// A leading `v` or `=` is tolerated, as extension authors commonly copy
/// git tags into their package descriptors.
pub fn parse_version(version: &str) -> std::result::Result<Version, semver::Error> {
    let trimmed = version.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('='))
        .unwrap_or(trimmed);
    Version::parse(trimmed)
}

/// Primitive comparison every range desugars into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    AtLeast,
    Above,
    AtMost,
    Below,
    Exactly,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    bound: Bound,
    version: Version,
}

impl Comparator {
    fn new(bound: Bound, version: Version) -> Self {
        Self { bound, version }
    }

    fn matches(&self, candidate: &Version) -> bool {
        match self.bound {
            Bound::AtLeast => candidate >= &self.version,
            Bound::Above => candidate > &self.version,
            Bound::AtMost => candidate <= &self.version,
            Bound::Below => candidate < &self.version,
            Bound::Exactly => candidate == &self.version,
            Bound::Not => candidate != &self.version,
        }
    }
}

/// Operator as written in the range, before desugaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Ne,
    Caret,
    Tilde,
}

/// A version with possibly missing or wildcard trailing components.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Partial {
    Any,
    Major(u64),
    Minor(u64, u64),
    Full(Version),
}

impl Partial {
    /// Lowest version the partial covers.
    fn floor(&self) -> Version {
        match self {
            Self::Any => Version::new(0, 0, 0),
            Self::Major(major) => Version::new(*major, 0, 0),
            Self::Minor(major, minor) => Version::new(*major, *minor, 0),
            Self::Full(version) => version.clone(),
        }
    }

    /// First version past the partial, `None` for `*` and full versions.
    fn ceiling(&self) -> Option<Version> {
        match self {
            Self::Major(major) => Some(Version::new(major.saturating_add(1), 0, 0)),
            Self::Minor(major, minor) => Some(Version::new(*major, minor.saturating_add(1), 0)),
            Self::Any | Self::Full(_) => None,
        }
    }
}

/// A parsed dependency range that can be checked against concrete versions.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    /// Alternatives; an empty set matches every version.
    sets: Vec<Vec<Comparator>>,
    raw: String,
}

impl VersionConstraint {
    pub fn parse(constraint: &str) -> Result<Self> {
        let raw = constraint.trim().to_string();
        let fail = |reason: String| Error::VersionConstraintParse {
            constraint: raw.clone(),
            reason,
        };
        if raw.is_empty() {
            return Err(fail("empty constraint".to_string()));
        }

        let sets = raw
            .split("||")
            .map(|set| parse_set(set.trim()).map_err(&fail))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sets, raw })
    }

    /// Returns `false` if `version` cannot be parsed.
    pub fn satisfies(&self, version: &str) -> bool {
        match parse_version(version) {
            Ok(parsed) => self.satisfies_version(&parsed),
            Err(_) => false,
        }
    }

    pub fn satisfies_version(&self, version: &Version) -> bool {
        self.sets
            .iter()
            .any(|set| set.iter().all(|comparator| comparator.matches(version)))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_set(set: &str) -> std::result::Result<Vec<Comparator>, String> {
    if set.is_empty() {
        return Err("empty alternative".to_string());
    }
    if let Some((low, high)) = set.split_once(" - ") {
        return hyphen_range(parse_partial(low.trim())?, parse_partial(high.trim())?);
    }

    // Operators may be separated from their version: `>= 1.0.0`.
    let mut tokens: Vec<String> = Vec::new();
    let mut pending = String::new();
    for token in set.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        pending.push_str(token);
        if !token.chars().all(|c| "<>=!^~".contains(c)) {
            tokens.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        return Err(format!("operator '{pending}' has no version"));
    }

    let mut comparators = Vec::new();
    for token in &tokens {
        let (operator, version) = split_operator(token);
        comparators.extend(desugar(operator, parse_partial(version)?)?);
    }
    Ok(comparators)
}

fn split_operator(token: &str) -> (Operator, &str) {
    const OPERATORS: [(&str, Operator); 10] = [
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("!=", Operator::Ne),
        ("==", Operator::Eq),
        ("~>", Operator::Tilde),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
        ("^", Operator::Caret),
        ("~", Operator::Tilde),
    ];
    OPERATORS
        .iter()
        .find_map(|(prefix, operator)| token.strip_prefix(prefix).map(|rest| (*operator, rest)))
        .unwrap_or((Operator::Eq, token))
}

fn parse_partial(text: &str) -> std::result::Result<Partial, String> {
    let text = text.strip_prefix('v').unwrap_or(text);
    if let Ok(version) = Version::parse(text) {
        return Ok(Partial::Full(version));
    }

    let mut numbers = Vec::new();
    let mut wildcard = false;
    let parts: Vec<&str> = text.split('.').collect();
    if parts.len() > 3 {
        return Err(format!("invalid version '{text}'"));
    }
    for part in parts {
        if matches!(part, "*" | "x" | "X") {
            wildcard = true;
        } else if !wildcard && !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            numbers.push(
                part.parse::<u64>()
                    .map_err(|e| format!("invalid version '{text}': {e}"))?,
            );
        } else {
            return Err(format!("invalid version '{text}'"));
        }
    }

    Ok(match numbers.as_slice() {
        [] => Partial::Any,
        [major] => Partial::Major(*major),
        [major, minor] => Partial::Minor(*major, *minor),
        [major, minor, patch] => Partial::Full(Version::new(*major, *minor, *patch)),
        _ => return Err(format!("invalid version '{text}'")),
    })
}

fn desugar(operator: Operator, partial: Partial) -> std::result::Result<Vec<Comparator>, String> {
    let floor = partial.floor();
    let ceiling = partial.ceiling();
    let at_least = Comparator::new(Bound::AtLeast, floor.clone());

    let comparators = match operator {
        Operator::Eq => match (&partial, ceiling) {
            (Partial::Any, _) => Vec::new(),
            (_, Some(ceiling)) => vec![at_least, Comparator::new(Bound::Below, ceiling)],
            (_, None) => vec![Comparator::new(Bound::Exactly, floor)],
        },
        Operator::Ne => match partial {
            Partial::Any => return Err("'!=*' matches nothing".to_string()),
            _ => vec![Comparator::new(Bound::Not, floor)],
        },
        Operator::Gte => match partial {
            Partial::Any => Vec::new(),
            _ => vec![at_least],
        },
        Operator::Gt => match (&partial, ceiling) {
            (Partial::Any, _) => return Err("'>*' matches nothing".to_string()),
            (_, Some(ceiling)) => vec![Comparator::new(Bound::AtLeast, ceiling)],
            (_, None) => vec![Comparator::new(Bound::Above, floor)],
        },
        Operator::Lt => match partial {
            Partial::Any => return Err("'<*' matches nothing".to_string()),
            _ => vec![Comparator::new(Bound::Below, floor)],
        },
        Operator::Lte => match (&partial, ceiling) {
            (Partial::Any, _) => Vec::new(),
            (_, Some(ceiling)) => vec![Comparator::new(Bound::Below, ceiling)],
            (_, None) => vec![Comparator::new(Bound::AtMost, floor)],
        },
        Operator::Caret => {
            let upper = match &partial {
                Partial::Any => return Ok(Vec::new()),
                Partial::Major(major) => Version::new(major + 1, 0, 0),
                Partial::Minor(0, minor) => Version::new(0, minor + 1, 0),
                Partial::Minor(major, _) => Version::new(major + 1, 0, 0),
                Partial::Full(v) if v.major > 0 => Version::new(v.major + 1, 0, 0),
                Partial::Full(v) if v.minor > 0 => Version::new(0, v.minor + 1, 0),
                Partial::Full(v) => Version::new(0, 0, v.patch + 1),
            };
            vec![at_least, Comparator::new(Bound::Below, upper)]
        }
        Operator::Tilde => {
            let upper = match &partial {
                Partial::Any => return Ok(Vec::new()),
                Partial::Major(major) => Version::new(major + 1, 0, 0),
                Partial::Minor(major, minor) => Version::new(*major, minor + 1, 0),
                Partial::Full(v) => Version::new(v.major, v.minor + 1, 0),
            };
            vec![at_least, Comparator::new(Bound::Below, upper)]
        }
    };
    Ok(comparators)
}

fn hyphen_range(low: Partial, high: Partial) -> std::result::Result<Vec<Comparator>, String> {
    let mut comparators = desugar(Operator::Gte, low)?;
    comparators.extend(desugar(Operator::Lte, high)?);
    Ok(comparators)
}
