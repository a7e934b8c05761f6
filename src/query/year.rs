// src/query/year.rs
//
// Typed year-expression parser. The grammar accepts exactly one mode per
// expression; mixing symbols is an error, which kills the ordering bugs a
// replace/split implementation invites.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One parsed year expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearExpr {
    Exact(BTreeSet<i32>),
    Range(i32, i32),
    GreaterEq(i32),
    LessThan(i32),
    NotIn(BTreeSet<i32>),
}

impl YearExpr {
    pub fn matches(&self, year: i32) -> bool {
        match self {
            YearExpr::Exact(set) => set.contains(&year),
            YearExpr::Range(lo, hi) => (*lo..=*hi).contains(&year),
            YearExpr::GreaterEq(y) => year >= *y,
            YearExpr::LessThan(y) => year < *y,
            YearExpr::NotIn(set) => !set.contains(&year),
        }
    }
}

impl FromStr for YearExpr {
    type Err = Error;

    fn from_str(expr: &str) -> Result<Self> {
        let text = expr.trim();
        let fail = |reason: &str| Error::InvalidYearExpression {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        if text.is_empty() {
            return Err(fail("empty expression"));
        }

        if let Some(rest) = text.strip_prefix("<>") {
            let years = parse_year_list(rest).map_err(|r| fail(&r))?;
            return Ok(YearExpr::NotIn(years));
        }
        if let Some(rest) = text.strip_prefix('>') {
            let year = parse_year(rest).map_err(|r| fail(&r))?;
            return Ok(YearExpr::GreaterEq(year));
        }
        if let Some(rest) = text.strip_prefix('<') {
            let year = parse_year(rest).map_err(|r| fail(&r))?;
            return Ok(YearExpr::LessThan(year));
        }
        if text.contains('-') {
            let (lo_text, hi_text) = text
                .split_once('-')
                .filter(|(a, b)| !a.is_empty() && !b.is_empty())
                .ok_or_else(|| fail("range needs two years"))?;
            let lo = parse_year(lo_text).map_err(|r| fail(&r))?;
            let hi = parse_year(hi_text).map_err(|r| fail(&r))?;
            // Normalized so lo <= hi regardless of how it was written.
            return Ok(if lo <= hi {
                YearExpr::Range(lo, hi)
            } else {
                YearExpr::Range(hi, lo)
            });
        }

        let years = parse_year_list(text).map_err(|r| fail(&r))?;
        Ok(YearExpr::Exact(years))
    }
}

/// A year token is strictly four digits starting 1 or 2; anything else,
/// including a stray symbol from a different mode, is rejected.
fn parse_year(text: &str) -> std::result::Result<i32, String> {
    let token = text.trim();
    let ok = token.len() == 4
        && token.starts_with(['1', '2'])
        && token.chars().all(|c| c.is_ascii_digit());
    if ok {
        Ok(token.parse().expect("four digits parse"))
    } else {
        Err(format!("bad year token {token:?}"))
    }
}

fn parse_year_list(text: &str) -> std::result::Result<BTreeSet<i32>, String> {
    let mut years = BTreeSet::new();
    for part in text.split(',') {
        years.insert(parse_year(part)?);
    }
    Ok(years)
}
