//! Core data model (§3): abstract packages, concrete packages, and the state
//! trits that describe a concrete package's install intent and lifecycle.
//!
//! Cross-references between abstract and concrete packages are plain indices
//! into the database's arenas (§9 design notes), not owning pointers - the
//! abstract/concrete/provider graph is cyclic by nature.

use std::collections::HashSet;

use crate::depend::Compound;
use crate::version::Version;

/// Stable index of an [`AbstractPackage`] within a [`crate::database::PackageDatabase`].
pub type AbstractId = usize;
/// Stable index of a [`Package`] within a [`crate::database::PackageDatabase`].
pub type PackageId = usize;

/// User-expressed intent for a concrete package (§3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateWant {
    #[default]
    Unknown,
    Install,
    Deinstall,
    Purge,
}

/// Lifecycle stage of a concrete package (§3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateStatus {
    #[default]
    NotInstalled,
    Unpacked,
    HalfConfigured,
    Installed,
    HalfInstalled,
    ConfigFiles,
    PostInstFailed,
    RemovalFailed,
}

impl StateStatus {
    /// `fetch_all_installed` (§4.3) treats these two statuses as "present".
    pub fn is_present(&self) -> bool {
        matches!(self, StateStatus::Installed | StateStatus::Unpacked)
    }
}

/// Sticky per-package bits (§3.4). Hand-rolled rather than a `bitflags!`
/// dependency, matching the small flag sets this codebase already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateFlags(u32);

impl StateFlags {
    pub const OK: StateFlags = StateFlags(0);
    pub const REINST_REQ: StateFlags = StateFlags(1 << 0);
    pub const HOLD: StateFlags = StateFlags(1 << 1);
    pub const REPLACE: StateFlags = StateFlags(1 << 2);
    pub const NO_PRUNE: StateFlags = StateFlags(1 << 3);
    pub const PREFER: StateFlags = StateFlags(1 << 4);
    pub const OBSOLETE: StateFlags = StateFlags(1 << 5);
    pub const USER: StateFlags = StateFlags(1 << 6);
    pub const FILELIST_CHANGED: StateFlags = StateFlags(1 << 7);
    pub const NEED_DETAIL: StateFlags = StateFlags(1 << 8);

    pub fn contains(&self, other: StateFlags) -> bool {
        other.0 == 0 || (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: StateFlags) {
        self.0 |= other.0;
    }

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /// Comma-joined list of set, non-volatile flag names, or `"ok"` if none
    /// are set - used by the §4.5 formatter.
    pub fn names(&self) -> Vec<&'static str> {
        let table: &[(StateFlags, &str)] = &[
            (StateFlags::REINST_REQ, "reinstreq"),
            (StateFlags::HOLD, "hold"),
            (StateFlags::REPLACE, "replace"),
            (StateFlags::NO_PRUNE, "noprune"),
            (StateFlags::PREFER, "prefer"),
            (StateFlags::OBSOLETE, "obsolete"),
            (StateFlags::USER, "user"),
            (StateFlags::FILELIST_CHANGED, "filelist-changed"),
            (StateFlags::NEED_DETAIL, "need-detail"),
        ];
        table
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// A declared configuration file and the digest recorded for it (§3.5).
#[derive(Debug, Clone)]
pub struct ConffileEntry {
    pub path: String,
    pub recorded_digest: Option<String>,
}

/// A concrete `(name, version, architecture)` package record (§3.4).
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub version: Version,
    pub architecture: String,
    pub arch_priority: i32,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub filename: Option<String>,
    pub local_filename: Option<String>,
    pub size: Option<u64>,
    pub installed_size: Option<u64>,
    pub md5sum: Option<String>,
    pub sha256sum: Option<String>,
    pub section: Option<String>,
    pub maintainer: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub conffiles: Vec<ConffileEntry>,
    pub auto_installed: bool,
    pub essential: bool,
    pub provided_by_hand: bool,
    pub state_want: StateWant,
    pub state_flag: StateFlags,
    pub state_status: StateStatus,
    pub depends: Vec<Compound>,
    pub conflicts: Vec<Compound>,
    pub provides: Vec<String>,
    pub replaces: Vec<String>,
}

impl Package {
    /// A fresh record with only the fields the parser cannot omit populated;
    /// everything optional starts absent so database merge (§3.4) has
    /// somewhere to fill in from a second, partial stanza.
    pub fn new(name: String, version: Version, architecture: String) -> Package {
        Package {
            name,
            version,
            architecture,
            arch_priority: 0,
            source: None,
            destination: None,
            filename: None,
            local_filename: None,
            size: None,
            installed_size: None,
            md5sum: None,
            sha256sum: None,
            section: None,
            maintainer: None,
            description: None,
            priority: None,
            tags: None,
            conffiles: Vec::new(),
            auto_installed: false,
            essential: false,
            provided_by_hand: false,
            state_want: StateWant::default(),
            state_flag: StateFlags::default(),
            state_status: StateStatus::default(),
            depends: Vec::new(),
            conflicts: Vec::new(),
            provides: Vec::new(),
            replaces: Vec::new(),
        }
    }

    /// Identity used for merge/dedupe in the database: name + version + arch (§3.4).
    pub fn identity(&self) -> (&str, &Version, &str) {
        (&self.name, &self.version, &self.architecture)
    }

    /// Merges `other` (a newer stanza for the same identity) into `self`:
    /// "take new value only when the old is absent" (§4.3).
    pub fn merge_from(&mut self, other: Package) {
        macro_rules! take_if_absent {
            ($field:ident) => {
                if self.$field.is_none() {
                    self.$field = other.$field;
                }
            };
        }
        take_if_absent!(source);
        take_if_absent!(destination);
        take_if_absent!(filename);
        take_if_absent!(local_filename);
        take_if_absent!(size);
        take_if_absent!(installed_size);
        take_if_absent!(md5sum);
        take_if_absent!(sha256sum);
        take_if_absent!(section);
        take_if_absent!(maintainer);
        take_if_absent!(description);
        take_if_absent!(priority);
        take_if_absent!(tags);

        if self.conffiles.is_empty() {
            self.conffiles = other.conffiles;
        }
        if self.depends.is_empty() {
            self.depends = other.depends;
        }
        if self.conflicts.is_empty() {
            self.conflicts = other.conflicts;
        }
        if self.provides.is_empty() {
            self.provides = other.provides;
        }
        if self.replaces.is_empty() {
            self.replaces = other.replaces;
        }
    }
}

/// Identity of a name that may be referenced by a dependency, independent of
/// any concrete version (§3.3).
#[derive(Debug, Clone, Default)]
pub struct AbstractPackage {
    pub name: String,
    pub concretes: Vec<PackageId>,
    pub providers: HashSet<AbstractId>,
    pub replaced_by: HashSet<AbstractId>,
    /// Cycle guard for the resolver (§4.4, §5). Process-wide mutable state,
    /// swept by [`crate::resolver::Resolver::reset`] before every fresh traversal.
    pub dependencies_checked: bool,
    pub need_detail: bool,
}

impl AbstractPackage {
    pub fn new(name: String) -> AbstractPackage {
        AbstractPackage {
            name,
            ..Default::default()
        }
    }
}
