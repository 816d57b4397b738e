use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use log::debug;

use super::model::{Feature, FeatureSet};
use crate::batch::StartPoint;
use crate::catalog::Candidate;
use crate::error::SkylineError;
use crate::name::NameResolver;

/// Tag holding a peak's elevation in metres.
pub const ELEVATION_KEY: &str = "ele";

/// Places with at least a million inhabitants.
pub const DEFAULT_START_QUERY: &str = "n[place=city,town,village,hamlet][name][population>=1000000]";
/// Anything tagged as a summit with a known elevation.
pub const DEFAULT_PEAK_QUERY: &str = "n[natural=peak,volcano,hill][ele]";

// ---------------------------------------------------------------------------
// Clause – one bracketed tag predicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
        }
    }
}

/// A single predicate on one tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `[key]` – tag present and not null.
    Present(String),
    /// `[!key]` – tag absent or null.
    Absent(String),
    /// `[key=a,b]` – tag text equals one of the values.
    OneOf(String, BTreeSet<String>),
    /// `[key!=a,b]` – tag absent or its text equals none of the values.
    NoneOf(String, BTreeSet<String>),
    /// `[key>=n]` and friends – numeric tag compared against `n`.
    Compare(String, Comparison, f64),
}

impl Clause {
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Clause::Present(key) => feature.tag(key).is_some(),
            Clause::Absent(key) => feature.tag(key).is_none(),
            Clause::OneOf(key, values) => feature.text(key).is_some_and(|t| values.contains(&t)),
            Clause::NoneOf(key, values) => !feature.text(key).is_some_and(|t| values.contains(&t)),
            Clause::Compare(key, op, rhs) => feature
                .tag(key)
                .and_then(|v| v.as_f64())
                .is_some_and(|lhs| op.holds(lhs, *rhs)),
        }
    }

    fn parse(body: &str) -> Result<Self> {
        let body = body.trim();
        if let Some(key) = body.strip_prefix('!') {
            return Ok(Clause::Absent(parse_key(key)?));
        }

        let Some(op_start) = body.find(['!', '=', '<', '>']) else {
            return Ok(Clause::Present(parse_key(body)?));
        };
        let key = parse_key(&body[..op_start])?;
        let rest = &body[op_start..];

        // Two-character operators first.
        for (token, op) in [
            ("!=", None),
            (">=", Some(Comparison::GreaterOrEqual)),
            ("<=", Some(Comparison::LessOrEqual)),
            ("=", None),
            (">", Some(Comparison::Greater)),
            ("<", Some(Comparison::Less)),
        ] {
            let Some(value) = rest.strip_prefix(token) else {
                continue;
            };
            return match op {
                Some(op) => {
                    let n = value
                        .trim()
                        .parse::<f64>()
                        .with_context(|| format!("'{}' is not a number", value.trim()))?;
                    Ok(Clause::Compare(key, op, n))
                }
                None => {
                    let values = parse_values(value)?;
                    if token == "!=" {
                        Ok(Clause::NoneOf(key, values))
                    } else {
                        Ok(Clause::OneOf(key, values))
                    }
                }
            };
        }
        bail!("unknown operator in '{rest}'")
    }
}

fn parse_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        bail!("empty tag key");
    }
    Ok(key.to_string())
}

fn parse_values(list: &str) -> Result<BTreeSet<String>> {
    let values: BTreeSet<String> = list
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        bail!("no values after '='");
    }
    Ok(values)
}

// ---------------------------------------------------------------------------
// FeatureQuery – all clauses must hold
// ---------------------------------------------------------------------------

/// A conjunction of tag clauses written as `n[key=a,b][key2][key3>=10]`.
///
/// The leading type letters (`n`, `nwa`, `*`) are accepted and ignored, since
/// every loaded feature is a point.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    source: String,
    clauses: Vec<Clause>,
}

impl FeatureQuery {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        self.clauses.iter().all(|c| c.matches(feature))
    }

    /// Matching features in load order.
    pub fn select<'a>(&'a self, set: &'a FeatureSet) -> impl Iterator<Item = &'a Feature> + 'a {
        set.features.iter().filter(move |f| self.matches(f))
    }
}

impl FromStr for FeatureQuery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let source = s.trim();
        let types_end = source.find('[').unwrap_or(source.len());
        let types = source[..types_end].trim();
        if !types.chars().all(|c| c.is_ascii_alphabetic() || c == '*') {
            bail!("query '{source}': unexpected '{types}' before the first clause");
        }

        let mut clauses = Vec::new();
        let mut rest = &source[types_end..];
        while let Some(open) = rest.find('[') {
            if !rest[..open].trim().is_empty() {
                bail!("query '{source}': unexpected '{}' between clauses", rest[..open].trim());
            }
            let close = rest[open..]
                .find(']')
                .map(|i| open + i)
                .with_context(|| format!("query '{source}': unclosed '['"))?;
            let body = &rest[open + 1..close];
            let clause = Clause::parse(body).with_context(|| format!("query '{source}': clause [{body}]"))?;
            clauses.push(clause);
            rest = &rest[close + 1..];
        }
        if !rest.trim().is_empty() {
            bail!("query '{source}': trailing '{}'", rest.trim());
        }

        Ok(FeatureQuery {
            source: source.to_string(),
            clauses,
        })
    }
}

impl fmt::Display for FeatureQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ---------------------------------------------------------------------------
// Selection of start points and candidate peaks
// ---------------------------------------------------------------------------

/// Start points matching `query`, in load order.
///
/// An empty selection is reported as [`SkylineError::NoStartPoints`].
pub fn select_start_points(
    set: &FeatureSet,
    query: &FeatureQuery,
    names: &NameResolver,
) -> crate::error::Result<Vec<StartPoint>> {
    let starts: Vec<StartPoint> = query
        .select(set)
        .map(|f| StartPoint::new(names.name_of(f), f.location))
        .collect();
    debug!("{} locations found.", starts.len());
    if starts.is_empty() {
        return Err(SkylineError::NoStartPoints);
    }
    Ok(starts)
}

/// Candidate peaks matching `query` that carry a readable elevation.
///
/// Outlier elevations are kept here; the catalog drops them.
pub fn select_candidates(set: &FeatureSet, query: &FeatureQuery, names: &NameResolver) -> Vec<Candidate> {
    let mut unreadable = 0usize;
    let candidates: Vec<Candidate> = query
        .select(set)
        .filter_map(|f| {
            let elevation = f
                .tag(ELEVATION_KEY)
                .and_then(|v| v.as_i64())
                .and_then(|e| i32::try_from(e).ok());
            if elevation.is_none() {
                unreadable += 1;
            }
            elevation.map(|e| Candidate::new(names.fields(f), e, f.location))
        })
        .collect();
    if unreadable > 0 {
        debug!("{unreadable} peaks skipped for an unreadable '{ELEVATION_KEY}' tag.");
    }
    debug!("{} mountains found.", candidates.len());
    candidates
}
