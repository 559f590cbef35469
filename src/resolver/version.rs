//! Version constraint parsing, matching and ordering
//!
//! Constraints follow the composer dialect used by package registries:
//! `^1.2`, `~1.2.3`, `>=1.0 <2.0`, `1.0.*`, `1.0 - 2.0` and `||` alternatives.
//! Versions are parsed loosely (leading `v`, one to four numeric parts).

use std::cmp::Ordering;

use crate::core::{NccError, NccResult};

/// A version constraint (e.g., ^1.0.0, ~2.1, >=3.0.0)
#[derive(Debug, Clone, PartialEq)]
pub enum VersionConstraint {
    /// Exact version (1.0.0)
    Exact(semver::Version),
    /// Caret range (^1.0.0 - compatible with 1.x.x)
    Caret(semver::Version),
    /// Tilde range; `~1.2` allows 1.x, `~1.2.3` allows 1.2.x
    Tilde(semver::Version, usize),
    /// Greater than or equal (>=1.0.0)
    GreaterOrEqual(semver::Version),
    /// Greater than (>1.0.0)
    GreaterThan(semver::Version),
    /// Less than or equal (<=1.0.0)
    LessOrEqual(semver::Version),
    /// Less than (<1.0.0)
    LessThan(semver::Version),
    /// Not equal (!=1.0.0)
    NotEqual(semver::Version),
    /// Any version (*)
    Any,
    /// Every constraint must match (`>=1.0 <2.0`, `>=1.0,<2.0`)
    All(Vec<VersionConstraint>),
    /// At least one constraint must match (`^1.0 || ^2.0`)
    AnyOf(Vec<VersionConstraint>),
}

impl VersionConstraint {
    /// Parse a version constraint string
    pub fn parse(s: &str) -> NccResult<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" || s.eq_ignore_ascii_case("latest") {
            return Ok(VersionConstraint::Any);
        }

        if s.contains("||") {
            let alternatives = s
                .split("||")
                .map(Self::parse)
                .collect::<NccResult<Vec<_>>>()?;
            return Ok(VersionConstraint::AnyOf(alternatives));
        }

        // Hyphen range (1.0.0 - 2.0.0)
        if let Some((low, high)) = s.split_once(" - ") {
            return Ok(VersionConstraint::All(vec![
                VersionConstraint::GreaterOrEqual(Self::parse_version(low)?),
                VersionConstraint::LessOrEqual(Self::parse_version(high)?),
            ]));
        }

        let terms = Self::split_terms(s);
        if terms.len() > 1 {
            let all = terms
                .iter()
                .map(|t| Self::parse_single(t))
                .collect::<NccResult<Vec<_>>>()?;
            return Ok(VersionConstraint::All(all));
        }

        Self::parse_single(s)
    }

    /// Split an AND-expression on commas and whitespace, keeping operators
    /// attached to their operands (`>= 1.0` stays one term)
    fn split_terms(s: &str) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for raw in s.split(|c: char| c == ',' || c.is_whitespace()) {
            if raw.is_empty() {
                continue;
            }
            match terms.last_mut() {
                Some(last) if last.chars().all(|c| "<>=!^~".contains(c)) => last.push_str(raw),
                _ => terms.push(raw.to_string()),
            }
        }
        terms
    }

    fn parse_single(s: &str) -> NccResult<Self> {
        let s = s.trim();

        if s == "*" {
            return Ok(VersionConstraint::Any);
        }

        if let Some(rest) = s.strip_prefix(">=") {
            return Ok(VersionConstraint::GreaterOrEqual(Self::parse_version(rest)?));
        }
        if let Some(rest) = s.strip_prefix("<=") {
            return Ok(VersionConstraint::LessOrEqual(Self::parse_version(rest)?));
        }
        if let Some(rest) = s.strip_prefix("!=") {
            return Ok(VersionConstraint::NotEqual(Self::parse_version(rest)?));
        }
        if let Some(rest) = s.strip_prefix('>') {
            return Ok(VersionConstraint::GreaterThan(Self::parse_version(rest)?));
        }
        if let Some(rest) = s.strip_prefix('<') {
            return Ok(VersionConstraint::LessThan(Self::parse_version(rest)?));
        }
        if let Some(rest) = s.strip_prefix('^') {
            return Ok(VersionConstraint::Caret(Self::parse_version(rest)?));
        }
        if let Some(rest) = s.strip_prefix('~') {
            let parts = rest.trim().split('-').next().unwrap_or("").split('.').count();
            return Ok(VersionConstraint::Tilde(Self::parse_version(rest)?, parts));
        }
        if let Some(rest) = s.strip_prefix("==").or_else(|| s.strip_prefix('=')) {
            return Ok(VersionConstraint::Exact(Self::parse_version(rest)?));
        }

        // Wildcards (1.x, 1.0.*)
        if s.ends_with(".*") || s.ends_with(".x") || s.ends_with(".X") {
            let base = &s[..s.len() - 2];
            let low = Self::parse_version(base)?;
            let high = match base.trim_start_matches(|c: char| c == 'v' || c == 'V').split('.').count() {
                1 => semver::Version::new(low.major + 1, 0, 0),
                _ => semver::Version::new(low.major, low.minor + 1, 0),
            };
            return Ok(VersionConstraint::All(vec![
                VersionConstraint::GreaterOrEqual(low),
                VersionConstraint::LessThan(high),
            ]));
        }

        Ok(VersionConstraint::Exact(Self::parse_version(s)?))
    }

    fn parse_version(s: &str) -> NccResult<semver::Version> {
        parse_loose(s).ok_or_else(|| {
            NccError::invalid_argument(format!("Invalid version constraint: {}", s.trim()))
        })
    }

    /// Check if a version matches this constraint
    pub fn matches(&self, version: &semver::Version) -> bool {
        match self {
            VersionConstraint::Exact(v) => version == v,
            VersionConstraint::Caret(v) => {
                if version < v {
                    return false;
                }
                if v.major == 0 {
                    if v.minor == 0 {
                        // ^0.0.x -> >=0.0.x <0.0.(x+1)
                        version.major == 0 && version.minor == 0 && version.patch == v.patch
                    } else {
                        // ^0.y.z -> >=0.y.z <0.(y+1).0
                        version.major == 0 && version.minor == v.minor
                    }
                } else {
                    // ^x.y.z -> >=x.y.z <(x+1).0.0
                    version.major == v.major
                }
            }
            VersionConstraint::Tilde(v, parts) => {
                if version < v {
                    return false;
                }
                if *parts <= 2 {
                    version.major == v.major
                } else {
                    version.major == v.major && version.minor == v.minor
                }
            }
            VersionConstraint::GreaterOrEqual(v) => version >= v,
            VersionConstraint::GreaterThan(v) => version > v,
            VersionConstraint::LessOrEqual(v) => version <= v,
            VersionConstraint::LessThan(v) => version < v,
            VersionConstraint::NotEqual(v) => version != v,
            VersionConstraint::Any => true,
            VersionConstraint::All(all) => all.iter().all(|c| c.matches(version)),
            VersionConstraint::AnyOf(any) => any.iter().any(|c| c.matches(version)),
        }
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionConstraint::Exact(v) => write!(f, "{}", v),
            VersionConstraint::Caret(v) => write!(f, "^{}", v),
            VersionConstraint::Tilde(v, _) => write!(f, "~{}", v),
            VersionConstraint::GreaterOrEqual(v) => write!(f, ">={}", v),
            VersionConstraint::GreaterThan(v) => write!(f, ">{}", v),
            VersionConstraint::LessOrEqual(v) => write!(f, "<={}", v),
            VersionConstraint::LessThan(v) => write!(f, "<{}", v),
            VersionConstraint::NotEqual(v) => write!(f, "!={}", v),
            VersionConstraint::Any => write!(f, "*"),
            VersionConstraint::All(all) => {
                let parts: Vec<String> = all.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
            VersionConstraint::AnyOf(any) => {
                let parts: Vec<String> = any.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", parts.join(" || "))
            }
        }
    }
}

/// Parse a version leniently: optional `v` prefix, one to four numeric parts
/// (the fourth is dropped) and an optional pre-release suffix
pub fn parse_loose(input: &str) -> Option<semver::Version> {
    let s = input.trim().trim_start_matches(|c: char| c == 'v' || c == 'V');
    let (core, suffix) = match s.find(|c: char| c == '-' || c == '+') {
        Some(i) => (&s[..i], Some(&s[i..])),
        None => (s, None),
    };

    let numbers = core
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if numbers.is_empty() || numbers.len() > 4 {
        return None;
    }

    let part = |i: usize| numbers.get(i).copied().unwrap_or(0);
    let mut version = semver::Version::new(part(0), part(1), part(2));

    if let Some(pre) = suffix.and_then(|s| s.strip_prefix('-')) {
        let pre = pre.split('+').next().unwrap_or("");
        version.pre = semver::Prerelease::new(pre).ok()?;
    }

    Some(version)
}

/// Check whether `version` satisfies `constraint`; unparseable input never does
pub fn satisfies(version: &str, constraint: &str) -> bool {
    match (parse_loose(version), VersionConstraint::parse(constraint)) {
        (Some(v), Ok(c)) => c.matches(&v),
        _ => false,
    }
}

/// Order two version strings
///
/// Parseable versions compare by semver precedence; anything else falls back
/// to a segment-wise comparison where numeric segments compare numerically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_loose(a), parse_loose(b)) {
        (Some(left), Some(right)) => left.cmp_precedence(&right),
        _ => compare_segments(a, b),
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let split = |s: &str| -> Vec<String> {
        s.trim_start_matches(|c: char| c == 'v' || c == 'V')
            .split(|c: char| c == '.' || c == '-' || c == '+' || c == '_')
            .map(str::to_string)
            .collect()
    };
    let (left, right) = (split(a), split(b));

    for (l, r) in left.iter().zip(right.iter()) {
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}
