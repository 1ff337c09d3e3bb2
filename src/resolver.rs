//! Dependency resolver (C4, §4.4): walks compound dependencies, detects
//! cycles, chooses among alternatives, and emits the set of packages needed
//! to satisfy a request plus the names that could not be satisfied.

use crate::database::PackageDatabase;
use crate::depend::{Compound, Kind};
use crate::package::{AbstractId, PackageId, StateWant};

/// Borrows the database for the duration of a resolve. Holding `&mut`
/// reflects §5: the cycle guard (`dependencies_checked`) is process-wide
/// mutable state the resolver flips as it walks.
pub struct Resolver<'a> {
    db: &'a mut PackageDatabase,
}

impl<'a> Resolver<'a> {
    pub fn new(db: &'a mut PackageDatabase) -> Resolver<'a> {
        Resolver { db }
    }

    /// Clears `dependencies_checked` on every abstract package. Every public
    /// entry point that performs a fresh traversal must call this first
    /// (§5); the recursive helpers rely on it being clean on entry.
    pub fn reset(&mut self) {
        for id in self.db.all_abstract_ids().collect::<Vec<_>>() {
            self.db.abstract_pkg_mut(id).dependencies_checked = false;
        }
    }

    /// Entry point (§4.4): the caller is expected to have called [`reset`]
    /// before this if a previous resolve ran on the same database.
    pub fn unsatisfied(&mut self, pkg_id: PackageId) -> (Vec<PackageId>, Vec<String>) {
        let mut to_install = Vec::new();
        let mut unresolved = Vec::new();
        self.resolve_pkg(pkg_id, &mut to_install, &mut unresolved);
        (to_install, unresolved)
    }

    fn name_abstract(&mut self, name: &str) -> AbstractId {
        self.db.intern_abstract(name)
    }

    fn resolve_pkg(
        &mut self,
        pkg_id: PackageId,
        to_install: &mut Vec<PackageId>,
        unresolved: &mut Vec<String>,
    ) {
        let name = self.db.package(pkg_id).name.clone();
        let abstract_id = self.name_abstract(&name);

        if self.db.abstract_pkg(abstract_id).dependencies_checked {
            return;
        }
        self.db.abstract_pkg_mut(abstract_id).dependencies_checked = true;

        let compounds = self.db.package(pkg_id).depends.clone();
        for compound in &compounds {
            match compound.kind {
                Kind::Greedy => self.resolve_greedy(compound, to_install, unresolved),
                Kind::Depend | Kind::PreDepend | Kind::Recommend | Kind::Suggest => {
                    self.resolve_normal(pkg_id, compound, to_install, unresolved)
                }
                Kind::Conflict => {}
            }
        }
    }

    fn resolve_normal(
        &mut self,
        pkg_id: PackageId,
        compound: &Compound,
        to_install: &mut Vec<PackageId>,
        unresolved: &mut Vec<String>,
    ) {
        let soft = matches!(compound.kind, Kind::Recommend | Kind::Suggest);

        // Pass A: an already-installed package satisfies some atom.
        for atom in &compound.atoms {
            let Some(abs_id) = self.db.abstract_by_name(&atom.name) else {
                continue;
            };
            let found = self
                .db
                .best_candidate(abs_id, true, |p| {
                    p.state_status.is_present() && atom.satisfies(&p.version)
                })
                .is_some();
            if found {
                return;
            }
        }

        // Pass B: any candidate at all satisfies some atom.
        for atom in &compound.atoms {
            let Some(abs_id) = self.db.abstract_by_name(&atom.name) else {
                continue;
            };
            let Some(candidate_id) = self
                .db
                .best_candidate(abs_id, true, |p| atom.satisfies(&p.version))
            else {
                continue;
            };

            let candidate_want = self.db.package(candidate_id).state_want;
            if soft && matches!(candidate_want, StateWant::Deinstall | StateWant::Purge) {
                // The user has vetoed this recommendation/suggestion; try the
                // next alternative instead of accepting the veto as failure.
                continue;
            }

            if compound.kind == Kind::Suggest {
                log::info!(
                    "[resolver] notice: suggested package '{}' is available",
                    self.db.package(candidate_id).name
                );
                return;
            }

            let (sub_install, sub_unresolved) = {
                let mut sub_install = Vec::new();
                let mut sub_unresolved = Vec::new();
                self.resolve_pkg(candidate_id, &mut sub_install, &mut sub_unresolved);
                (sub_install, sub_unresolved)
            };

            unresolved.extend(sub_unresolved);
            for id in sub_install {
                if !to_install.contains(&id) && id != pkg_id {
                    to_install.push(id);
                }
            }

            if candidate_id != pkg_id && !to_install.contains(&candidate_id) {
                // Pulled in to satisfy someone else's dependency, not
                // requested directly - mark it auto-installed (§4.4,
                // resolved Open Question).
                self.db.package_mut(candidate_id).auto_installed = true;
                to_install.push(candidate_id);
            }
            return;
        }

        if soft {
            log::info!(
                "[resolver] notice: {} '{}' could not be satisfied",
                if compound.kind == Kind::Recommend {
                    "recommendation"
                } else {
                    "suggestion"
                },
                compound
            );
        } else {
            unresolved.push(compound.to_string());
        }
    }

    fn resolve_greedy(
        &mut self,
        compound: &Compound,
        to_install: &mut Vec<PackageId>,
        _unresolved: &mut Vec<String>,
    ) {
        for atom in &compound.atoms {
            let Some(abs_id) = self.db.abstract_by_name(&atom.name) else {
                continue;
            };

            for candidate_id in self.db.provider_concretes(abs_id) {
                let candidate = self.db.package(candidate_id);
                if candidate.state_want == StateWant::Install {
                    continue;
                }
                let candidate_name = candidate.name.clone();
                let candidate_abstract = self.name_abstract(&candidate_name);
                if self.db.abstract_pkg(candidate_abstract).dependencies_checked {
                    continue;
                }
                if to_install.contains(&candidate_id) {
                    continue;
                }

                let mut sub_install = Vec::new();
                let mut sub_unresolved = Vec::new();
                self.resolve_pkg(candidate_id, &mut sub_install, &mut sub_unresolved);

                let all_already_wanted = sub_install
                    .iter()
                    .all(|&id| self.db.package(id).state_want == StateWant::Install);

                if sub_unresolved.is_empty() && all_already_wanted {
                    log::info!(
                        "[resolver] notice: Adding satisfier for greedy dependence: {}",
                        candidate_name
                    );
                    if !to_install.contains(&candidate_id) {
                        to_install.push(candidate_id);
                    }
                }
                // Greedy satisfiers are opportunistic, not required (§4.4,
                // glossary) - an incomplete satisfier is skipped silently,
                // never surfaced as an unresolved dependency.
            }
        }
    }
}

/// Every installed package (or one with `state_want = Install`) that matches
/// any of `pkg`'s conflict atoms and is not replaced by `pkg` (§4.4).
pub fn conflicts(db: &PackageDatabase, pkg_id: PackageId) -> Vec<PackageId> {
    let pkg = db.package(pkg_id);
    let mut result = Vec::new();

    for compound in &pkg.conflicts {
        for atom in &compound.atoms {
            let Some(abs_id) = db.abstract_by_name(&atom.name) else {
                continue;
            };
            for candidate_id in db.provider_concretes(abs_id) {
                if candidate_id == pkg_id {
                    continue;
                }
                let candidate = db.package(candidate_id);
                let active = candidate.state_status.is_present()
                    || candidate.state_want == StateWant::Install;
                if active && atom.satisfies(&candidate.version) && !replaces(pkg, candidate) {
                    result.push(candidate_id);
                }
            }
        }
    }

    result
}

/// `pkg.Replaces` intersects `other.Provides` (§3.4, §4.4).
pub fn replaces(pkg: &crate::package::Package, other: &crate::package::Package) -> bool {
    pkg.replaces.iter().any(|name| other.provides.iter().any(|p| p == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{load_into_db, FieldMask};
    use crate::database::ArchPriority;

    fn db_with(content: &str) -> PackageDatabase {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm", "all"]));
        load_into_db(&mut db, content, &FieldMask::all());
        db
    }

    fn find(db: &PackageDatabase, name: &str) -> PackageId {
        let abs = db.abstract_by_name(name).unwrap();
        db.abstract_pkg(abs).concretes[0]
    }

    #[test]
    fn s1_simple_install() {
        let mut db = db_with(
            "Package: A\nVersion: 1.0\nArchitecture: arm\nStatus: install ok installed\n\n\
             Package: B\nVersion: 2.0\nArchitecture: arm\nDepends: A (>= 1.0)\nStatus: install ok not-installed\n",
        );
        let b = find(&db, "B");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(b);
        assert!(install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn s2_missing_dep() {
        let mut db = db_with(
            "Package: A\nVersion: 1.0\nArchitecture: arm\nStatus: install ok installed\n\n\
             Package: B\nVersion: 2.0\nArchitecture: arm\nDepends: A (>= 2.0)\nStatus: install ok not-installed\n",
        );
        let b = find(&db, "B");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(b);
        assert!(install.is_empty());
        assert_eq!(unresolved, vec!["A (>= 2.0)".to_string()]);
    }

    #[test]
    fn s3_alternatives_satisfied_by_second() {
        let mut db = db_with(
            "Package: Y\nVersion: 1.0\nArchitecture: arm\nStatus: install ok installed\n\n\
             Package: C\nVersion: 1.0\nArchitecture: arm\nDepends: X | Y\nStatus: install ok not-installed\n",
        );
        let c = find(&db, "C");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(c);
        assert!(install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn s4_satisfied_via_provides() {
        let mut db = db_with(
            "Package: postfix\nVersion: 3.0\nArchitecture: arm\nProvides: mail-transport-agent\nStatus: install ok installed\n\n\
             Package: C\nVersion: 1.0\nArchitecture: arm\nDepends: mail-transport-agent\nStatus: install ok not-installed\n",
        );
        let c = find(&db, "C");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(c);
        assert!(install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn s5_conflict_resolved_by_replaces() {
        let mut db = db_with(
            "Package: old-foo\nVersion: 1.0\nArchitecture: arm\nStatus: install ok installed\n\n\
             Package: new-foo\nVersion: 2.0\nArchitecture: arm\nConflicts: old-foo\nReplaces: old-foo\nStatus: install ok not-installed\n",
        );
        let new_foo = find(&db, "new-foo");
        let result = conflicts(&db, new_foo);
        assert!(result.is_empty());
    }

    #[test]
    fn conflict_without_replaces_is_reported() {
        let mut db = db_with(
            "Package: old-foo\nVersion: 1.0\nArchitecture: arm\nStatus: install ok installed\n\n\
             Package: new-foo\nVersion: 2.0\nArchitecture: arm\nConflicts: old-foo\nStatus: install ok not-installed\n",
        );
        let new_foo = find(&db, "new-foo");
        let result = conflicts(&db, new_foo);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn no_deps_returns_empty() {
        let mut db = db_with("Package: lonely\nVersion: 1.0\nArchitecture: arm\nStatus: install ok not-installed\n");
        let lonely = find(&db, "lonely");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(lonely);
        assert!(install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn cycle_terminates_and_is_idempotent() {
        let mut db = db_with(
            "Package: A\nVersion: 1.0\nArchitecture: arm\nDepends: B\nStatus: install ok not-installed\n\n\
             Package: B\nVersion: 1.0\nArchitecture: arm\nDepends: A\nStatus: install ok not-installed\n",
        );
        let a = find(&db, "A");

        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let first = resolver.unsatisfied(a);

        resolver.reset();
        let second = resolver.unsatisfied(a);

        assert_eq!(first.1, second.1);
        assert_eq!(first.0.len(), second.0.len());
    }

    #[test]
    fn recommend_pulled_in_is_marked_auto_installed() {
        let mut db = db_with(
            "Package: rec\nVersion: 1.0\nArchitecture: arm\nStatus: install ok not-installed\n\n\
             Package: base\nVersion: 1.0\nArchitecture: arm\nRecommends: rec\nStatus: install ok not-installed\n",
        );
        let base = find(&db, "base");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, _) = resolver.unsatisfied(base);
        assert_eq!(install.len(), 1);
        assert!(db.package(install[0]).auto_installed);
    }

    #[test]
    fn greedy_dep_added_when_all_already_wanted() {
        let mut db = db_with(
            "Package: helper\nVersion: 1.0\nArchitecture: arm\nStatus: install ok installed\n\n\
             Package: base\nVersion: 1.0\nArchitecture: arm\nDepends: helper *\nStatus: install ok not-installed\n",
        );
        let base = find(&db, "base");
        let helper = find(&db, "helper");
        db.package_mut(helper).state_want = StateWant::Install;

        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(base);
        assert!(unresolved.is_empty());
        assert!(install.contains(&helper));
    }

    #[test]
    fn greedy_dep_skipped_when_not_fully_satisfied() {
        let mut db = db_with(
            "Package: needs-more\nVersion: 1.0\nArchitecture: arm\nDepends: missing-thing\nStatus: install ok not-installed\n\n\
             Package: base\nVersion: 1.0\nArchitecture: arm\nDepends: needs-more *\nStatus: install ok not-installed\n",
        );
        let base = find(&db, "base");
        let needs_more = find(&db, "needs-more");

        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(base);
        assert!(!install.contains(&needs_more));
        assert!(unresolved.is_empty());
    }

    #[test]
    fn vetoed_recommend_is_not_an_error() {
        let mut db = db_with(
            "Package: rec\nVersion: 1.0\nArchitecture: arm\nStatus: deinstall ok not-installed\n\n\
             Package: base\nVersion: 1.0\nArchitecture: arm\nRecommends: rec\nStatus: install ok not-installed\n",
        );
        let base = find(&db, "base");
        let mut resolver = Resolver::new(&mut db);
        resolver.reset();
        let (install, unresolved) = resolver.unsatisfied(base);
        assert!(install.is_empty());
        assert!(unresolved.is_empty());
    }
}
