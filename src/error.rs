use std::fmt;

/// The error kinds the core distinguishes (§7). Parsers recover and skip the
/// offending stanza on `Malformed`; the resolver never returns an error at all,
/// it accumulates `Unsatisfied` into its own output list instead (§4.4).
#[derive(Debug)]
pub enum CoreError {
    /// A stanza could not be parsed into a valid record.
    Malformed(String),
    /// A name was looked up that has no abstract entry and no provider.
    UnknownPackage(String),
    /// The resolver could not satisfy a required dependency; carries the
    /// compound's printable form.
    Unsatisfied(String),
    /// `package` conflicts with `other` and `other` is not replaced by `package`.
    Conflict { package: String, other: String },
    /// Raised by the integrity-check collaborator (§6).
    VersionMismatch {
        package: String,
        expected: String,
        actual: String,
    },
    /// A collaborator (downloader, archive reader, digest source) failed.
    Io { kind: String, path: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Malformed(detail) => write!(f, "malformed stanza: {}", detail),
            CoreError::UnknownPackage(name) => write!(f, "unknown package: {}", name),
            CoreError::Unsatisfied(compound) => {
                write!(f, "unsatisfied dependency: {}", compound)
            }
            CoreError::Conflict { package, other } => {
                write!(f, "{} conflicts with installed {}", package, other)
            }
            CoreError::VersionMismatch {
                package,
                expected,
                actual,
            } => write!(
                f,
                "{}: expected digest {}, got {}",
                package, expected, actual
            ),
            CoreError::Io { kind, path } => write!(f, "io error ({}) at {}", kind, path),
        }
    }
}

impl std::error::Error for CoreError {}
