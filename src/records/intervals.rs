//! Resource interval sets in batsim notation (`"0-3 7 9-10"`).

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Sorted, merged list of inclusive resource ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet(Vec<(u32, u32)>);

impl IntervalSet {
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().flat_map(|&(lo, hi)| lo..=hi)
    }
}

impl FromStr for IntervalSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for token in s.split_whitespace() {
            let (lo, hi) = match token.split_once('-') {
                Some((lo, hi)) => (parse_id(lo, token)?, parse_id(hi, token)?),
                None => {
                    let id = parse_id(token, token)?;
                    (id, id)
                }
            };
            if lo > hi {
                return Err(format!("reversed interval '{}'", token));
            }
            ranges.push((lo, hi));
        }

        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        Ok(IntervalSet(merged))
    }
}

fn parse_id(s: &str, token: &str) -> Result<u32, String> {
    s.parse()
        .map_err(|_| format!("invalid resource interval '{}'", token))
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (lo, hi)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if lo == hi {
                write!(f, "{}", lo)?;
            } else {
                write!(f, "{}-{}", lo, hi)?;
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for IntervalSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
