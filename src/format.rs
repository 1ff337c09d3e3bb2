//! Package formatter (C5, §4.5): serializes a concrete [`Package`] back to
//! stanza form, e.g. for writing the installed-status database.

use std::fmt::Write as _;

use crate::depend::{Compound, Kind};
use crate::package::Package;

fn format_depends(depends: &[Compound], kind: Kind) -> String {
    depends
        .iter()
        .filter(|c| c.kind == kind)
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_status(pkg: &Package) -> String {
    let want = match pkg.state_want {
        crate::package::StateWant::Unknown => "unknown",
        crate::package::StateWant::Install => "install",
        crate::package::StateWant::Deinstall => "deinstall",
        crate::package::StateWant::Purge => "purge",
    };
    let flags = pkg.state_flag.names();
    let flags = if flags.is_empty() {
        "ok".to_string()
    } else {
        flags.join(",")
    };
    let status = match pkg.state_status {
        crate::package::StateStatus::NotInstalled => "not-installed",
        crate::package::StateStatus::Unpacked => "unpacked",
        crate::package::StateStatus::HalfConfigured => "half-configured",
        crate::package::StateStatus::Installed => "installed",
        crate::package::StateStatus::HalfInstalled => "half-installed",
        crate::package::StateStatus::ConfigFiles => "config-files",
        crate::package::StateStatus::PostInstFailed => "post-inst-failed",
        crate::package::StateStatus::RemovalFailed => "removal-failed",
    };
    format!("{} {} {}", want, flags, status)
}

/// Serializes `pkg` as a stanza. Field order is fixed per §4.5; empty fields
/// are omitted.
pub fn format(pkg: &Package) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Package: {}", pkg.name);
    let _ = writeln!(out, "Version: {}", pkg.version);

    let depends = format_depends(&pkg.depends, Kind::Depend);
    if !depends.is_empty() {
        let _ = writeln!(out, "Depends: {}", depends);
    }
    let recommends = format_depends(&pkg.depends, Kind::Recommend);
    if !recommends.is_empty() {
        let _ = writeln!(out, "Recommends: {}", recommends);
    }
    let suggests = format_depends(&pkg.depends, Kind::Suggest);
    if !suggests.is_empty() {
        let _ = writeln!(out, "Suggests: {}", suggests);
    }
    if !pkg.provides.is_empty() {
        // Self-provision (own name, always element 0) is implicit and not
        // re-emitted - the parser reinstates it on load (§3.3 invariant).
        let rest: Vec<&String> = pkg.provides.iter().filter(|p| *p != &pkg.name).collect();
        if !rest.is_empty() {
            let rendered: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
            let _ = writeln!(out, "Provides: {}", rendered.join(", "));
        }
    }
    if !pkg.replaces.is_empty() {
        let _ = writeln!(out, "Replaces: {}", pkg.replaces.join(", "));
    }
    let conflicts = format_depends(&pkg.conflicts, Kind::Conflict);
    if !conflicts.is_empty() {
        let _ = writeln!(out, "Conflicts: {}", conflicts);
    }

    let _ = writeln!(out, "Status: {}", format_status(pkg));

    if let Some(section) = &pkg.section {
        let _ = writeln!(out, "Section: {}", section);
    }
    if pkg.essential {
        let _ = writeln!(out, "Essential: yes");
    }
    let _ = writeln!(out, "Architecture: {}", pkg.architecture);
    if let Some(maintainer) = &pkg.maintainer {
        let _ = writeln!(out, "Maintainer: {}", maintainer);
    }
    if let Some(md5) = &pkg.md5sum {
        let _ = writeln!(out, "MD5sum: {}", md5);
    }
    if let Some(size) = pkg.size {
        let _ = writeln!(out, "Size: {}", size);
    }
    if let Some(filename) = &pkg.filename {
        let _ = writeln!(out, "Filename: {}", filename);
    }
    if !pkg.conffiles.is_empty() {
        let _ = writeln!(out, "Conffiles:");
        for entry in &pkg.conffiles {
            let digest = entry.recorded_digest.as_deref().unwrap_or("");
            let _ = writeln!(out, " {} {}", entry.path, digest);
        }
    }
    if let Some(source) = &pkg.source {
        let _ = writeln!(out, "Source: {}", source);
    }
    if let Some(description) = &pkg.description {
        let mut lines = description.split('\n');
        if let Some(first) = lines.next() {
            let _ = writeln!(out, "Description: {}", first);
        }
        for line in lines {
            let _ = writeln!(out, " {}", line);
        }
    }
    if let Some(tags) = &pkg.tags {
        let _ = writeln!(out, "Tags: {}", tags.join(", "));
    }

    out
}
