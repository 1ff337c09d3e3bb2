//! Control-file parser (C2, §4.2): turns a stanza stream into [`Package`]
//! records, including the dependency sublanguage and `Status`/`Conffiles`
//! handling. Loading parsed records into a [`PackageDatabase`] also applies
//! the `Provides`/`Replaces` graph bookkeeping from §4.2 and §4.3.

use std::collections::HashMap;

use crate::database::PackageDatabase;
use crate::depend::{Compound, Kind};
use crate::error::CoreError;
use crate::package::{ConffileEntry, Package, StateStatus, StateWant};
use crate::utils::{
    split_stanzas, stanza_lines, stanza_opt_list, stanza_opt_text, stanza_opt_value,
    stanza_value,
};
use crate::version::Version;

/// Controls which optional fields the parser materializes (§4.2). Masked-out
/// fields are parsed-past without storing, which matters on constrained
/// devices parsing large package indices. `Package`, `Version` and
/// `Architecture` are never masked - a record without them is malformed.
#[derive(Debug, Clone)]
pub struct FieldMask {
    fields: Option<std::collections::HashSet<&'static str>>,
}

impl FieldMask {
    /// Materialize every recognized field.
    pub fn all() -> FieldMask {
        FieldMask { fields: None }
    }

    /// Materialize only the named fields (plus the three mandatory ones).
    pub fn only(fields: &[&'static str]) -> FieldMask {
        FieldMask {
            fields: Some(fields.iter().copied().collect()),
        }
    }

    pub fn wants(&self, field: &str) -> bool {
        match &self.fields {
            None => true,
            Some(set) => set.contains(field),
        }
    }
}

/// Parses one stanza already split into field -> lines, producing a `Package`.
/// A stanza with no `Package` field is malformed and is the caller's
/// responsibility to skip (§4.2 end-of-stanza handling).
pub fn parse_package(
    stanza: &HashMap<String, Vec<String>>,
    mask: &FieldMask,
) -> Result<Package, CoreError> {
    let name = stanza_value("Package", stanza)?;
    let version = Version::parse(&stanza_value("Version", stanza)?);
    let architecture = stanza_opt_value("Architecture", stanza).unwrap_or_else(|| "all".to_string());

    let mut pkg = Package::new(name, version, architecture);

    if mask.wants("Source") {
        pkg.source = stanza_opt_value("Source", stanza);
    }
    if mask.wants("Maintainer") {
        pkg.maintainer = stanza_opt_value("Maintainer", stanza);
    }
    if mask.wants("Section") {
        pkg.section = stanza_opt_value("Section", stanza);
    }
    if mask.wants("Priority") {
        pkg.priority = stanza_opt_value("Priority", stanza);
    }
    if mask.wants("Filename") {
        pkg.filename = stanza_opt_value("Filename", stanza);
    }
    if mask.wants("Size") {
        pkg.size = stanza_opt_value("Size", stanza).and_then(|v| v.parse().ok());
    }
    if mask.wants("Installed-Size") {
        pkg.installed_size = stanza_opt_value("Installed-Size", stanza).and_then(|v| v.parse().ok());
    }
    if mask.wants("MD5sum") {
        pkg.md5sum = stanza_opt_value("MD5sum", stanza).or_else(|| stanza_opt_value("MD5Sum", stanza));
    }
    if mask.wants("SHA256sum") {
        pkg.sha256sum = stanza_opt_value("SHA256sum", stanza);
    }
    if mask.wants("Description") {
        pkg.description = stanza_opt_text("Description", stanza);
    }
    if mask.wants("Tags") {
        pkg.tags = stanza_opt_list("Tags", stanza);
    }
    if mask.wants("Essential") {
        pkg.essential = stanza_opt_value("Essential", stanza)
            .map(|v| v.eq_ignore_ascii_case("yes"))
            .unwrap_or(false);
    }
    if mask.wants("Auto-Installed") {
        pkg.auto_installed = stanza_opt_value("Auto-Installed", stanza)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("yes"))
            .unwrap_or(false);
    }

    if mask.wants("Depends") {
        let mut depends = Vec::new();
        depends.extend(parse_dep_field("Pre-Depends", stanza, Kind::PreDepend)?);
        depends.extend(parse_dep_field("Depends", stanza, Kind::Depend)?);
        depends.extend(parse_dep_field("Recommends", stanza, Kind::Recommend)?);
        depends.extend(parse_dep_field("Suggests", stanza, Kind::Suggest)?);
        pkg.depends = depends;
    }
    if mask.wants("Conflicts") {
        pkg.conflicts = parse_dep_field("Conflicts", stanza, Kind::Conflict)?;
    }
    if mask.wants("Provides") {
        pkg.provides = parse_name_list("Provides", stanza);
    }
    if mask.wants("Replaces") {
        pkg.replaces = parse_name_list("Replaces", stanza);
    }
    if mask.wants("Conffiles") {
        pkg.conffiles = parse_conffiles(stanza)?;
    }
    if mask.wants("Status") {
        if let Ok(status) = stanza_value("Status", stanza) {
            let (want, flag, status) = parse_status(&status)?;
            pkg.state_want = want;
            pkg.state_flag = flag;
            pkg.state_status = status;
        }
    }

    Ok(pkg)
}

fn parse_dep_field(
    field: &str,
    stanza: &HashMap<String, Vec<String>>,
    kind: Kind,
) -> Result<Vec<Compound>, CoreError> {
    match stanza_value(field, stanza) {
        Ok(text) => Compound::parse_list(&text, kind),
        Err(_) => Ok(Vec::new()),
    }
}

/// `Provides`/`Replaces` are comma- and whitespace-tokenized name lists, not
/// full dependency expressions (§4.2).
fn parse_name_list(field: &str, stanza: &HashMap<String, Vec<String>>) -> Vec<String> {
    match stanza_value(field, stanza) {
        Ok(text) => text
            .split(',')
            .flat_map(|part| part.split_whitespace())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// `Status`: three whitespace-separated tokens - want, flags, status (§4.2).
/// A line with a different token count is malformed (§7).
fn parse_status(value: &str) -> Result<(StateWant, crate::package::StateFlags, StateStatus), CoreError> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(CoreError::Malformed(format!(
            "Status line must have 3 tokens, got {}: '{}'",
            tokens.len(),
            value
        )));
    }

    let want = match tokens[0] {
        "install" => StateWant::Install,
        "deinstall" => StateWant::Deinstall,
        "purge" => StateWant::Purge,
        _ => StateWant::Unknown,
    };

    let mut flag = crate::package::StateFlags::default();
    if tokens[1] != "ok" {
        for name in tokens[1].split(',') {
            match name {
                "reinstreq" => flag.insert(crate::package::StateFlags::REINST_REQ),
                "hold" => flag.insert(crate::package::StateFlags::HOLD),
                _ => {}
            }
        }
    }

    let status = match tokens[2] {
        "not-installed" => StateStatus::NotInstalled,
        "unpacked" => StateStatus::Unpacked,
        "half-configured" => StateStatus::HalfConfigured,
        "installed" => StateStatus::Installed,
        "half-installed" => StateStatus::HalfInstalled,
        "config-files" => StateStatus::ConfigFiles,
        "post-inst-failed" => StateStatus::PostInstFailed,
        "removal-failed" => StateStatus::RemovalFailed,
        other => {
            return Err(CoreError::Malformed(format!(
                "unrecognized status '{}'",
                other
            )))
        }
    };

    Ok((want, flag, status))
}

/// `Conffiles` is multi-line: each continuation line carries `<path> <digest>`
/// (§4.2, §3.5). The digest is recognized as MD5 (32 hex chars) or SHA-256
/// (64 hex chars); anything else is recorded with no digest.
fn parse_conffiles(stanza: &HashMap<String, Vec<String>>) -> Result<Vec<ConffileEntry>, CoreError> {
    let lines = match stanza_lines("Conffiles", stanza, true) {
        Ok(lines) => lines,
        Err(_) => return Ok(Vec::new()),
    };

    Ok(lines
        .into_iter()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let path = parts.next()?.to_string();
            let digest = parts.next().map(|d| d.to_string());
            Some(ConffileEntry {
                path,
                recorded_digest: digest,
            })
        })
        .collect())
}

/// Parses a full stanza stream and returns the successfully parsed records.
/// Malformed stanzas are logged and silently discarded (§4.2, §7).
pub fn parse(content: &str, mask: &FieldMask) -> Vec<Package> {
    split_stanzas(content)
        .into_iter()
        .filter_map(|stanza| match parse_package(&stanza, mask) {
            Ok(pkg) => Some(pkg),
            Err(e) => {
                log::error!("[control::parse] discarding malformed stanza: {}", e);
                None
            }
        })
        .collect()
}

/// Parses a stanza stream and loads every record into `db`, applying the
/// `Provides` and `Replaces`/`Conflicts` graph bookkeeping (§4.2, §4.3).
pub fn load_into_db(db: &mut PackageDatabase, content: &str, mask: &FieldMask) {
    for pkg in parse(content, mask) {
        let replaces = pkg.replaces.clone();
        let conflicts_names: Vec<String> = pkg
            .conflicts
            .iter()
            .flat_map(|c| c.atoms.iter().map(|a| a.name.clone()))
            .collect();

        let pkg_name = pkg.name.clone();
        db.insert(pkg);
        let pkg_abstract = db.intern_abstract(&pkg_name);

        for replaced_name in replaces {
            if conflicts_names.iter().any(|c| c == &replaced_name) {
                let replaced_abstract = db.intern_abstract(&replaced_name);
                db.record_replaces(pkg_abstract, replaced_abstract);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ArchPriority;

    const STANZA: &str = "\
Package: foo
Version: 1:2.0-1
Architecture: arm
Depends: libc6 (>= 2.17), libssl | libgnutls
Conflicts: old-foo
Replaces: old-foo
Provides: foo-virtual
Description: short summary
 long description line one
 long description line two
Conffiles:
 /etc/foo.conf 5f4dcc3b5aa765d61d8327deb882cf99
Status: install ok installed
";

    #[test]
    fn parses_full_stanza() {
        let stanzas = split_stanzas(STANZA);
        let pkg = parse_package(&stanzas[0], &FieldMask::all()).unwrap();

        assert_eq!(pkg.name, "foo");
        assert_eq!(pkg.version.epoch, 1);
        assert_eq!(pkg.architecture, "arm");
        assert_eq!(pkg.depends.len(), 1);
        assert_eq!(pkg.depends[0].atoms.len(), 2);
        assert_eq!(pkg.conflicts.len(), 1);
        assert_eq!(pkg.replaces, vec!["old-foo"]);
        assert_eq!(pkg.provides, vec!["foo-virtual"]);
        assert_eq!(
            pkg.description.as_deref(),
            Some("short summary\nlong description line one\nlong description line two")
        );
        assert_eq!(pkg.conffiles.len(), 1);
        assert_eq!(pkg.conffiles[0].path, "/etc/foo.conf");
        assert_eq!(pkg.state_status, StateStatus::Installed);
        assert_eq!(pkg.state_want, StateWant::Install);
    }

    #[test]
    fn missing_package_field_is_malformed() {
        let stanzas = split_stanzas("Version: 1.0\n");
        assert!(parse_package(&stanzas[0], &FieldMask::all()).is_err());
    }

    #[test]
    fn status_with_wrong_token_count_is_malformed() {
        let stanzas = split_stanzas("Package: a\nVersion: 1.0\nStatus: install ok\n");
        assert!(parse_package(&stanzas[0], &FieldMask::all()).is_err());
    }

    #[test]
    fn field_mask_skips_unwanted_fields() {
        let stanzas = split_stanzas(STANZA);
        let mask = FieldMask::only(&[]);
        let pkg = parse_package(&stanzas[0], &mask).unwrap();
        assert!(pkg.description.is_none());
        assert!(pkg.depends.is_empty());
        assert!(pkg.provides.is_empty());
    }

    #[test]
    fn load_into_db_applies_replace_symmetry() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        load_into_db(&mut db, STANZA, &FieldMask::all());

        let foo = db.abstract_by_name("foo").unwrap();
        let old_foo = db.abstract_by_name("old-foo").unwrap();
        assert!(db.abstract_pkg(old_foo).replaced_by.contains(&foo));
    }

    #[test]
    fn self_provision_is_first_provides_entry() {
        let mut db = PackageDatabase::new(ArchPriority::from_ordered(&["arm"]));
        load_into_db(&mut db, STANZA, &FieldMask::all());
        let id = db.abstract_pkg(db.abstract_by_name("foo").unwrap()).concretes[0];
        assert_eq!(db.package(id).provides[0], "foo");
    }
}
