//! Node kinds and textual node identifiers.
//!
//! Identifiers follow the grammar `^(h|s)[1-9][0-9]*$`: the prefix selects the
//! kind (and with it the allocator namespace), the suffix is a positive number.
//! The suffix is stored as a `u64`, so numbers above [`NodeName::MAX_NUMBER`]
//! are rejected even though they match the grammar.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// Category of a topology vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Host,
    Switch,
}

impl NodeKind {
    pub const ALL: [NodeKind; 2] = [NodeKind::Host, NodeKind::Switch];

    /// The identifier prefix for this kind.
    pub const fn prefix(self) -> char {
        match self {
            NodeKind::Host => 'h',
            NodeKind::Switch => 's',
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Host => f.write_str("host"),
            NodeKind::Switch => f.write_str("switch"),
        }
    }
}

/// A parsed node identifier such as `h12` or `s3`.
///
/// Ordering follows the textual form (`h10` sorts before `h2`), which is the
/// order the canonical topology format uses. Numeric ordering is the
/// allocator's concern and works on [`NodeName::number`] directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeName {
    kind: NodeKind,
    number: u64,
}

impl NodeName {
    /// Largest number an identifier may carry.
    pub const MAX_NUMBER: u64 = u64::MAX;

    /// Build a name from its parts. Returns `None` for the reserved number 0.
    pub fn new(kind: NodeKind, number: u64) -> Option<Self> {
        (number > 0).then_some(Self { kind, number })
    }

    /// Pool numbers are issued from 1 upwards, so the allocator skips the check.
    pub(crate) const fn issued(kind: NodeKind, number: u64) -> Self {
        debug_assert!(number > 0);
        Self { kind, number }
    }

    pub fn host(number: u64) -> Option<Self> {
        Self::new(NodeKind::Host, number)
    }

    pub fn switch(number: u64) -> Option<Self> {
        Self::new(NodeKind::Switch, number)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.number)
    }
}

impl fmt::Debug for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Ord for NodeName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .prefix()
            .cmp(&other.kind.prefix())
            .then_with(|| cmp_decimal_text(self.number, other.number))
    }
}

/// Compare the decimal renderings of two positive numbers as strings.
///
/// The longer number is cut down to the shorter one's digit count; if the
/// leading digits tie, the shorter (a textual prefix) sorts first.
fn cmp_decimal_text(a: u64, b: u64) -> Ordering {
    let (da, db) = (a.ilog10(), b.ilog10());
    match da.cmp(&db) {
        Ordering::Equal => a.cmp(&b),
        Ordering::Greater => (a / 10u64.pow(da - db)).cmp(&b).then(Ordering::Greater),
        Ordering::Less => a.cmp(&(b / 10u64.pow(db - da))).then(Ordering::Less),
    }
}

impl PartialOrd for NodeName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The string did not match `^(h|s)[1-9][0-9]*$`, or its number exceeds
/// [`NodeName::MAX_NUMBER`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node id {0:?} (expected h<N> or s<N> with 1 <= N <= 18446744073709551615)")]
pub struct InvalidName(pub String);

impl FromStr for NodeName {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_name.parse(s).map_err(|_| InvalidName(s.to_string()))
    }
}

impl Serialize for NodeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Grammar ─────────────────────────────────────────────────────────────

fn parse_kind(input: &mut &str) -> ModalResult<NodeKind> {
    alt(('h'.value(NodeKind::Host), 's'.value(NodeKind::Switch))).parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<u64> {
    (one_of('1'..='9'), take_while(0.., |c: char| c.is_ascii_digit()))
        .take()
        .try_map(str::parse::<u64>)
        .parse_next(input)
}

fn parse_name(input: &mut &str) -> ModalResult<NodeName> {
    (parse_kind, parse_number)
        .map(|(kind, number)| NodeName { kind, number })
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hosts_and_switches() {
        let h: NodeName = "h12".parse().unwrap();
        assert_eq!(h.kind(), NodeKind::Host);
        assert_eq!(h.number(), 12);

        let s: NodeName = "s3".parse().unwrap();
        assert_eq!(s.kind(), NodeKind::Switch);
        assert_eq!(s.to_string(), "s3");
    }

    #[test]
    fn rejects_ids_outside_grammar() {
        for bad in ["", "h", "h0", "h01", "x1", "H1", "h1a", " h1", "s-1"] {
            assert!(bad.parse::<NodeName>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn numbers_span_the_full_u64_range() {
        let big: NodeName = "h99999999999".parse().unwrap();
        assert_eq!(big.number(), 99_999_999_999);

        let max: NodeName = "s18446744073709551615".parse().unwrap();
        assert_eq!(max.number(), NodeName::MAX_NUMBER);

        let err = "h18446744073709551616".parse::<NodeName>().unwrap_err();
        assert!(err.to_string().contains("18446744073709551615"), "{err}");
    }

    #[test]
    fn zero_is_not_a_valid_number() {
        assert!(NodeName::host(0).is_none());
        assert!(NodeName::switch(1).is_some());
    }

    #[test]
    fn ordering_is_textual() {
        let mut names: Vec<NodeName> = ["s1", "h2", "h10", "h1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        names.sort();
        let rendered: Vec<String> = names.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["h1", "h10", "h2", "s1"]);
    }

    #[test]
    fn ordering_matches_string_comparison() {
        let samples = [
            1, 2, 9, 10, 11, 19, 2, 20, 99, 100, 101, 123, 1234, 21, 3, 4_000_000_000, 40,
            u64::MAX, 18, 1_844,
        ];
        for &a in &samples {
            for &b in &samples {
                let (na, nb) = (NodeName::host(a).unwrap(), NodeName::host(b).unwrap());
                assert_eq!(
                    na.cmp(&nb),
                    na.to_string().cmp(&nb.to_string()),
                    "{na} vs {nb}"
                );
            }
        }
    }

    #[test]
    fn serde_uses_the_textual_form() {
        let h = NodeName::host(7).unwrap();
        assert_eq!(serde_json::to_string(&h).unwrap(), "\"h7\"");
        let back: NodeName = serde_json::from_str("\"h7\"").unwrap();
        assert_eq!(back, h);
        assert!(serde_json::from_str::<NodeName>("\"q7\"").is_err());
    }
}
