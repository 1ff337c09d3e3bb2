//! Package database (C3, §4.3): the bipartite abstract/concrete relation plus
//! the indices needed to look a name up and pick the best candidate under
//! architecture-priority and version ordering.

use std::collections::HashMap;

use crate::package::{AbstractId, AbstractPackage, Package, PackageId, StateStatus};

/// Ordered configuration mapping architecture name -> numeric priority
/// (higher wins); §3.6, §4.3, §10.3.
#[derive(Debug, Clone, Default)]
pub struct ArchPriority {
    priorities: HashMap<String, i32>,
}

impl ArchPriority {
    pub fn new() -> ArchPriority {
        ArchPriority::default()
    }

    /// Builds a priority table from an ordered list, highest-priority first.
    pub fn from_ordered(archs: &[&str]) -> ArchPriority {
        let mut table = ArchPriority::new();
        let len = archs.len() as i32;
        for (i, arch) in archs.iter().enumerate() {
            table.priorities.insert(arch.to_string(), len - i as i32);
        }
        table
    }

    pub fn priority_of(&self, arch: &str) -> Option<i32> {
        self.priorities.get(arch).copied()
    }
}

/// Process-wide package database: `init -> populate -> query/mutate -> teardown`
/// (§5). Queries are pure reads; `insert` mutates.
#[derive(Debug, Default)]
pub struct PackageDatabase {
    abstracts: Vec<AbstractPackage>,
    by_name: HashMap<String, AbstractId>,
    packages: Vec<Package>,
    pub arch_priority: ArchPriority,
}

impl PackageDatabase {
    pub fn new(arch_priority: ArchPriority) -> PackageDatabase {
        PackageDatabase {
            abstracts: Vec::new(),
            by_name: HashMap::new(),
            packages: Vec::new(),
            arch_priority,
        }
    }

    /// Idempotent: creates the abstract on first use, otherwise returns the
    /// existing id (§4.3).
    pub fn intern_abstract(&mut self, name: &str) -> AbstractId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = self.abstracts.len();
        self.abstracts.push(AbstractPackage::new(name.to_string()));
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn abstract_by_name(&self, name: &str) -> Option<AbstractId> {
        self.by_name.get(name).copied()
    }

    pub fn abstract_pkg(&self, id: AbstractId) -> &AbstractPackage {
        &self.abstracts[id]
    }

    pub fn abstract_pkg_mut(&mut self, id: AbstractId) -> &mut AbstractPackage {
        &mut self.abstracts[id]
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id]
    }

    pub fn all_abstract_ids(&self) -> impl Iterator<Item = AbstractId> {
        0..self.abstracts.len()
    }

    /// Inserts a concrete package (§4.3): attaches it to its own abstract by
    /// name and to every abstract it provides, recording itself as a
    /// provider. If an identical (name+version+arch) package already exists,
    /// merges into it per §3.4 instead of duplicating.
    pub fn insert(&mut self, mut pkg: Package) -> PackageId {
        // Self-provision (§3.3 invariant): a package always provides its own name.
        if !pkg.provides.iter().any(|p| p == &pkg.name) {
            pkg.provides.insert(0, pkg.name.clone());
        }

        let name_abstract = self.intern_abstract(&pkg.name);

        if let Some(existing_id) = self.abstracts[name_abstract]
            .concretes
            .iter()
            .copied()
            .find(|&id| {
                let existing = &self.packages[id];
                existing.version == pkg.version && existing.architecture == pkg.architecture
            })
        {
            self.packages[existing_id].merge_from(pkg);
            return existing_id;
        }

        let id = self.packages.len();
        let provides = pkg.provides.clone();
        self.packages.push(pkg);

        self.abstracts[name_abstract].concretes.push(id);

        for provided_name in &provides {
            let provided_abstract = self.intern_abstract(provided_name);
            self.abstracts[provided_abstract].providers.insert(name_abstract);
        }
        // Self-provision closure (§3.6): an abstract always provides itself.
        self.abstracts[name_abstract].providers.insert(name_abstract);

        id
    }

    /// Records that `replacer`'s abstract replaces `replaced`'s abstract
    /// (§4.2 Replaces handling, §3.6 replace symmetry).
    pub fn record_replaces(&mut self, replacer: AbstractId, replaced: AbstractId) {
        self.abstracts[replaced].replaced_by.insert(replacer);
    }

    /// The provider closure of an abstract: itself plus every abstract whose
    /// `Provides` lists it (§9 glossary).
    pub fn provider_closure(&self, id: AbstractId) -> Vec<AbstractId> {
        self.abstracts[id].providers.iter().copied().collect()
    }

    /// Currently installed package for a name, if any (§4.3).
    pub fn fetch_installed(&self, name: &str) -> Option<&Package> {
        let id = self.by_name.get(name)?;
        self.abstracts[*id]
            .concretes
            .iter()
            .map(|&pid| &self.packages[pid])
            .find(|p| p.state_status.is_present())
    }

    /// Snapshot of every package with status `Installed` or `Unpacked` (§4.3).
    pub fn fetch_all_installed(&self) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| p.state_status.is_present())
            .collect()
    }

    /// Every concrete package reachable from `abstract_id`'s provider closure
    /// (used by the resolver's greedy-dependency and conflict scans).
    pub fn provider_concretes(&self, abstract_id: AbstractId) -> Vec<PackageId> {
        self.provider_closure(abstract_id)
            .into_iter()
            .flat_map(|provider| self.abstracts[provider].concretes.iter().copied())
            .collect()
    }

    /// Best concrete package providing `abstract_id` matching `predicate`,
    /// maximizing (architecture-priority, version) (§4.3, §5 ordering
    /// guarantees). `honor_arch` excludes architectures absent from the
    /// configured priority table (§3.6).
    pub fn best_candidate<F>(
        &self,
        abstract_id: AbstractId,
        honor_arch: bool,
        predicate: F,
    ) -> Option<PackageId>
    where
        F: Fn(&Package) -> bool,
    {
        let mut best: Option<PackageId> = None;
        let mut best_priority = i32::MIN;

        for provider in self.provider_closure(abstract_id) {
            for &pid in &self.abstracts[provider].concretes {
                let pkg = &self.packages[pid];
                if !predicate(pkg) {
                    continue;
                }

                let priority = match self.arch_priority.priority_of(&pkg.architecture) {
                    Some(p) => p,
                    None if honor_arch => continue,
                    None => 0,
                };

                let better = match best {
                    None => true,
                    Some(current_id) => {
                        let current = &self.packages[current_id];
                        (priority, &pkg.version) > (best_priority, &current.version)
                    }
                };

                if better {
                    best = Some(pid);
                    best_priority = priority;
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn installed(name: &str, version: &str) -> Package {
        let mut p = Package::new(name.into(), Version::parse(version), "arm".into());
        p.state_status = StateStatus::Installed;
        p
    }

    #[test]
    fn inv1_concrete_reachable_via_own_abstract() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        let id = db.insert(installed("foo", "1.0"));
        let abs = db.abstract_by_name("foo").unwrap();
        assert!(db.abstract_pkg(abs).concretes.contains(&id));
    }

    #[test]
    fn inv2_provides_links_provider() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        let mut p = installed("postfix", "3.0");
        p.provides.push("mail-transport-agent".to_string());
        db.insert(p);

        let mta = db.abstract_by_name("mail-transport-agent").unwrap();
        let postfix = db.abstract_by_name("postfix").unwrap();
        assert!(db.abstract_pkg(mta).providers.contains(&postfix));
    }

    #[test]
    fn self_provision_invariant() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        db.insert(installed("foo", "1.0"));
        let abs = db.abstract_by_name("foo").unwrap();
        assert!(db.abstract_pkg(abs).providers.contains(&abs));
    }

    #[test]
    fn merge_on_identical_identity() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        let mut a = installed("foo", "1.0");
        a.section = Some("utils".into());
        let id1 = db.insert(a);

        let mut b = Package::new("foo".into(), Version::parse("1.0"), "arm".into());
        b.maintainer = Some("me@example.com".into());
        let id2 = db.insert(b);

        assert_eq!(id1, id2);
        let merged = db.package(id1);
        assert_eq!(merged.section.as_deref(), Some("utils"));
        assert_eq!(merged.maintainer.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn best_candidate_prefers_higher_arch_priority_then_version() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm64", "armhf"]));
        let mut low_arch_new = Package::new("foo".into(), Version::parse("2.0"), "armhf".into());
        low_arch_new.state_status = StateStatus::Installed;
        let mut high_arch_old = Package::new("foo".into(), Version::parse("1.0"), "arm64".into());
        high_arch_old.state_status = StateStatus::Installed;

        db.insert(low_arch_new);
        db.insert(high_arch_old);

        let abs = db.abstract_by_name("foo").unwrap();
        let best = db
            .best_candidate(abs, true, |_| true)
            .map(|id| db.package(id));
        assert_eq!(best.unwrap().architecture, "arm64");
    }

    #[test]
    fn best_candidate_excludes_unknown_arch_when_honored() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm64"]));
        db.insert(installed("foo", "1.0"));
        let mut mips = Package::new("foo".into(), Version::parse("2.0"), "mips".into());
        mips.state_status = StateStatus::Installed;
        db.insert(mips);

        let abs = db.abstract_by_name("foo").unwrap();
        let best = db
            .best_candidate(abs, true, |_| true)
            .map(|id| db.package(id).version.to_string());
        assert_eq!(best.as_deref(), Some("1.0"));
    }

    #[test]
    fn fetch_all_installed_filters_by_status() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        db.insert(installed("foo", "1.0"));
        db.insert(Package::new("bar".into(), Version::parse("1.0"), "arm".into()));

        let installed_pkgs = db.fetch_all_installed();
        assert_eq!(installed_pkgs.len(), 1);
        assert_eq!(installed_pkgs[0].name, "foo");
    }
}
