//! Dependency sublanguage (C2, §4.2, §6): compound dependencies made of OR'd
//! atoms, each an abstract package name with an optional version constraint.

use crate::version::{Constraint, Version};
use std::fmt;

/// The kind of relationship a compound dependency expresses (§3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    PreDepend,
    Depend,
    Recommend,
    Suggest,
    Conflict,
    Greedy,
}

/// One alternative within a compound dependency: `NAME [ "(" op version ")" ]`.
#[derive(Debug, Clone)]
pub struct Atom {
    pub name: String,
    pub constraint: Option<(Constraint, Version)>,
}

impl Atom {
    /// Parses a single atom, e.g. `libc6 (>= 2.17)` or bare `mail-transport-agent`.
    pub fn parse(text: &str) -> Result<Atom, crate::error::CoreError> {
        let text = text.trim();
        match text.split_once('(') {
            None => Ok(Atom {
                name: text.to_string(),
                constraint: None,
            }),
            Some((name, rest)) => {
                let name = name.trim().to_string();
                let rest = rest.trim().trim_end_matches(')').trim();
                let (op, ver) = rest.split_once(char::is_whitespace).ok_or_else(|| {
                    crate::error::CoreError::Malformed(format!(
                        "invalid version constraint '{}'",
                        rest
                    ))
                })?;
                let constraint = Constraint::parse(op.trim())?;
                let version = Version::parse(ver.trim());
                Ok(Atom {
                    name,
                    constraint: Some((constraint, version)),
                })
            }
        }
    }

    pub fn satisfies(&self, candidate: &Version) -> bool {
        crate::version::satisfies(
            candidate,
            self.constraint.as_ref().map(|(c, v)| (*c, v)),
        )
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            None => write!(f, "{}", self.name),
            Some((op, v)) => write!(f, "{} ({} {})", self.name, op, v),
        }
    }
}

/// A non-empty ordered list of atoms joined by OR (`|`), with an inferred kind.
#[derive(Debug, Clone)]
pub struct Compound {
    pub atoms: Vec<Atom>,
    pub kind: Kind,
}

impl Compound {
    /// Parses one comma-separated element of a dependency field: `a | b | c [*]`.
    /// `base_kind` is the kind implied by the field the compound came from
    /// (`Depends` -> `Depend`, etc.); a trailing `*` promotes it to `Greedy`.
    pub fn parse(text: &str, base_kind: Kind) -> Result<Compound, crate::error::CoreError> {
        let text = text.trim();
        let (text, greedy) = match text.strip_suffix('*') {
            Some(stripped) => (stripped.trim(), true),
            None => (text, false),
        };

        let atoms: Result<Vec<Atom>, _> = text.split('|').map(Atom::parse).collect();
        let atoms = atoms?;
        if atoms.is_empty() {
            return Err(crate::error::CoreError::Malformed(
                "empty compound dependency".to_string(),
            ));
        }

        Ok(Compound {
            atoms,
            kind: if greedy { Kind::Greedy } else { base_kind },
        })
    }

    /// Parses a full comma-separated dependency list field.
    pub fn parse_list(
        text: &str,
        base_kind: Kind,
    ) -> Result<Vec<Compound>, crate::error::CoreError> {
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Compound::parse(s, base_kind))
            .collect()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.atoms.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", rendered.join(" | "))?;
        if self.kind == Kind::Greedy {
            write!(f, " *")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_parses_bare_name() {
        let a = Atom::parse("mail-transport-agent").unwrap();
        assert_eq!(a.name, "mail-transport-agent");
        assert!(a.constraint.is_none());
    }

    #[test]
    fn atom_parses_constrained() {
        let a = Atom::parse("libc6 (>= 2.17)").unwrap();
        assert_eq!(a.name, "libc6");
        let (op, ver) = a.constraint.unwrap();
        assert_eq!(op, Constraint::Ge);
        assert_eq!(ver.upstream, "2.17");
    }

    #[test]
    fn atom_maps_deprecated_operators() {
        let a = Atom::parse("foo (< 1.0)").unwrap();
        assert_eq!(a.constraint.unwrap().0, Constraint::Le);
        let a = Atom::parse("foo (> 1.0)").unwrap();
        assert_eq!(a.constraint.unwrap().0, Constraint::Ge);
    }

    #[test]
    fn compound_parses_alternatives() {
        let c = Compound::parse("X | Y", Kind::Depend).unwrap();
        assert_eq!(c.atoms.len(), 2);
        assert_eq!(c.atoms[0].name, "X");
        assert_eq!(c.atoms[1].name, "Y");
        assert_eq!(c.kind, Kind::Depend);
    }

    #[test]
    fn compound_trailing_star_is_greedy() {
        let c = Compound::parse("X | Y *", Kind::Depend).unwrap();
        assert_eq!(c.kind, Kind::Greedy);
        assert_eq!(c.atoms.len(), 2);
    }

    #[test]
    fn parse_list_splits_on_comma() {
        let list = Compound::parse_list("A (>= 1.0), B | C, D", Kind::Depend).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].atoms.len(), 2);
    }

    #[test]
    fn display_round_trips_readable_form() {
        let c = Compound::parse("A (>= 1.0) | B", Kind::Depend).unwrap();
        assert_eq!(c.to_string(), "A (>= 1.0) | B");
    }
}
