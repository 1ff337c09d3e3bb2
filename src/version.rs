//! Version algebra (C1): parsing and comparing Debian-style `[epoch:]upstream[-revision]`
//! version strings, and evaluating constraint predicates against them.

use std::cmp::Ordering;
use std::fmt;

use crate::error::CoreError;

/// A single `epoch:upstream-revision` version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub epoch: u64,
    pub upstream: String,
    pub revision: String,
}

impl Version {
    /// Parses a raw version string per §4.1: split on the first `:` for the epoch,
    /// then on the last `-` for the revision. A malformed epoch is logged and
    /// treated as 0 - the version string itself is never rejected.
    pub fn parse(raw: &str) -> Version {
        let (epoch, tail) = match raw.split_once(':') {
            Some((e, rest)) => {
                let epoch = e.trim().parse::<u64>().unwrap_or_else(|err| {
                    log::warn!("[Version::parse] malformed epoch '{}': {}", e, err);
                    0
                });
                (epoch, rest)
            }
            None => (0, raw),
        };

        let (upstream, revision) = match tail.rsplit_once('-') {
            Some((u, r)) => (u, r),
            None => (tail, ""),
        };

        Version {
            epoch,
            upstream: upstream.to_string(),
            revision: revision.to_string(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if !self.revision.is_empty() {
            write!(f, "-{}", self.revision)?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_debian(&self.upstream, &other.upstream))
            .then_with(|| compare_debian(&self.revision, &other.revision))
    }
}

/// Per-character weight used by the Debian non-digit-run ordering rule:
/// `~` sorts before end-of-string, which sorts before letters, which sort
/// before everything else.
fn char_order(c: Option<char>) -> i32 {
    match c {
        None => 0,
        Some('~') => -1,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(c) => c as i32 + 256,
    }
}

/// Compares two version component strings using the Debian `dpkg --compare-versions`
/// rule (§3.1): alternating non-digit and digit runs, non-digit runs compared
/// character-by-character via `char_order`, digit runs compared numerically with
/// leading zeros ignored.
pub fn compare_debian(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        // Non-digit run.
        loop {
            let ac = a.peek().copied().filter(|c| !c.is_ascii_digit());
            let bc = b.peek().copied().filter(|c| !c.is_ascii_digit());
            if ac.is_none() && bc.is_none() {
                break;
            }
            let ord = char_order(ac).cmp(&char_order(bc));
            if ord != Ordering::Equal {
                return ord;
            }
            if ac.is_some() {
                a.next();
            }
            if bc.is_some() {
                b.next();
            }
        }

        // Digit run: consume leading zeros, then compare numeric value, with the
        // longer digit-run of equal value tie-broken by the first differing digit.
        let a_digits: String = std::iter::from_fn(|| a.next_if(|c| c.is_ascii_digit())).collect();
        let b_digits: String = std::iter::from_fn(|| b.next_if(|c| c.is_ascii_digit())).collect();

        if a_digits.is_empty() && b_digits.is_empty() {
            return Ordering::Equal;
        }
        // An absent digit run sorts below any present one, even "0" - the
        // null revision is less than any non-empty revision (§4.1).
        if a_digits.is_empty() || b_digits.is_empty() {
            return if a_digits.is_empty() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        let a_trimmed = a_digits.trim_start_matches('0');
        let b_trimmed = b_digits.trim_start_matches('0');

        let ord = a_trimmed
            .len()
            .cmp(&b_trimmed.len())
            .then_with(|| a_trimmed.cmp(b_trimmed));
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// Relational operator recognized in the dependency mini-language (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Constraint {
    /// Parses an operator token, mapping the deprecated `<`/`>` to `<=`/`>=` per §4.2.
    pub fn parse(op: &str) -> Result<Constraint, CoreError> {
        match op {
            "<<" => Ok(Constraint::Lt),
            "<=" | "<" => Ok(Constraint::Le),
            "=" => Ok(Constraint::Eq),
            ">=" | ">" => Ok(Constraint::Ge),
            ">>" => Ok(Constraint::Gt),
            other => Err(CoreError::Malformed(format!(
                "unknown version relation '{}'",
                other
            ))),
        }
    }

    /// Does `ord` (the result of comparing a candidate version against the
    /// constraint's version) satisfy this constraint?
    pub fn admits(&self, ord: Ordering) -> bool {
        match (self, ord) {
            (Constraint::Lt, Ordering::Less) => true,
            (Constraint::Le, Ordering::Less | Ordering::Equal) => true,
            (Constraint::Eq, Ordering::Equal) => true,
            (Constraint::Ge, Ordering::Equal | Ordering::Greater) => true,
            (Constraint::Gt, Ordering::Greater) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Constraint::Lt => "<<",
            Constraint::Le => "<=",
            Constraint::Eq => "=",
            Constraint::Ge => ">=",
            Constraint::Gt => ">>",
        };
        write!(f, "{}", s)
    }
}

/// Evaluates `compare(pkg_version, atom) satisfies constraint` (§4.1). A `None`
/// constraint/version pair is always satisfied.
pub fn satisfies(pkg_version: &Version, constraint: Option<(Constraint, &Version)>) -> bool {
    match constraint {
        None => true,
        Some((rel, required)) => rel.admits(pkg_version.cmp(required)),
    }
}
