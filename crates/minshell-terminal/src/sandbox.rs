//! Path sandbox: resolves user-supplied paths and keeps them under the root.
//!
//! Containment is always checked on the canonical form of a path, never on
//! the raw string, so `..` traversal, absolute-path injection and symlinks
//! that point outside the root are all rejected the same way.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use minshell_types::error::SandboxViolation;

use crate::session::Session;

/// Filesystems whose path comparison ignores case.
const CASE_INSENSITIVE: bool = cfg!(any(windows, target_os = "macos"));

/// Which kinds of existing entry a command accepts for a path argument.
///
/// The rule only applies to entries that already exist; a path that names
/// nothing yet always passes so commands can create new files and folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRule {
    /// Reject existing directories.
    File,
    /// Reject existing regular files.
    Directory,
    Either,
}

impl EntryRule {
    pub fn allows_file(self) -> bool {
        matches!(self, Self::File | Self::Either)
    }

    pub fn allows_dir(self) -> bool {
        matches!(self, Self::Directory | Self::Either)
    }
}

/// Resolve `raw` against the session's working directory and root.
pub fn resolve(
    session: &Session<'_>,
    raw: &str,
    rule: EntryRule,
) -> Result<PathBuf, SandboxViolation> {
    let resolved = resolve_in(session.root(), session.cwd(), raw, rule);
    if let Err(violation) = resolved {
        log::warn!("sandbox rejected {raw:?}: {violation}");
    }
    resolved
}

/// Resolve `raw` against an explicit root and working directory.
///
/// Absolute inputs are taken as-is; relative ones are joined onto `cwd`.
/// The result is canonical and guaranteed to lie at or under `root`.
pub fn resolve_in(
    root: &Path,
    cwd: &Path,
    raw: &str,
    rule: EntryRule,
) -> Result<PathBuf, SandboxViolation> {
    let raw_path = Path::new(raw);
    let joined = if raw_path.is_absolute() {
        raw_path.to_path_buf()
    } else {
        cwd.join(raw_path)
    };

    let candidate = canonicalize_lenient(&joined);
    let root = canonicalize_lenient(root);
    if !is_within(&root, &candidate) {
        return Err(SandboxViolation::OutsideRoot);
    }
    if !rule.allows_file() && candidate.is_file() {
        return Err(SandboxViolation::FileNotAllowed);
    }
    if !rule.allows_dir() && candidate.is_dir() {
        return Err(SandboxViolation::DirectoryNotAllowed);
    }
    Ok(candidate)
}

/// Lexically normalise a path: drop `.`, fold `..` into its parent.
///
/// `..` at the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {},
            Component::ParentDir => {
                out.pop();
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Symlink hops followed before giving up, matching the Linux `ELOOP` limit.
const MAX_LINK_HOPS: usize = 40;

/// Canonicalise a path that may not exist yet.
///
/// The deepest existing ancestor is canonicalised by the OS (resolving
/// symlinks); the not-yet-existing tail is re-appended verbatim. A dangling
/// symlink on the way is replaced by its target, so the result names the
/// place a write would actually land.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut current = normalize(path);
    for _ in 0..MAX_LINK_HOPS {
        match canonicalize_prefix(&current) {
            Ok(canonical) => return canonical,
            Err(relinked) => current = relinked,
        }
    }
    // Past the hop limit the OS refuses to open the path anyway.
    current
}

/// One pass of [`canonicalize_lenient`]. `Err` carries the path with the
/// first dangling symlink substituted by its target, to be resolved again.
fn canonicalize_prefix(path: &Path) -> Result<PathBuf, PathBuf> {
    let mut existing = path;
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut canonical) = existing.canonicalize() {
            for part in tail.iter().rev() {
                canonical.push(part);
            }
            return Ok(canonical);
        }
        if let Ok(target) = std::fs::read_link(existing) {
            let parent = existing.parent().unwrap_or(Path::new(""));
            let base = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
            let mut next = base.join(target);
            for part in tail.iter().rev() {
                next.push(part);
            }
            return Err(normalize(&next));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            },
            _ => return Ok(path.to_path_buf()),
        }
    }
}

/// Whether `candidate` equals `root` or lies beneath it.
///
/// Both arguments must already be canonical. The comparison is
/// component-wise, so `/data/files2` is not inside `/data/files`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    if CASE_INSENSITIVE {
        let root = with_trailing_separator(root).to_lowercase();
        let candidate = with_trailing_separator(candidate).to_lowercase();
        candidate.starts_with(&root)
    } else {
        candidate.starts_with(root)
    }
}

fn with_trailing_separator(path: &Path) -> String {
    let mut s = path.to_string_lossy().into_owned();
    if !s.ends_with(std::path::MAIN_SEPARATOR) {
        s.push(std::path::MAIN_SEPARATOR);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;
    use proptest::prelude::*;
    use std::path::MAIN_SEPARATOR as SEP;

    #[test]
    fn relative_path_inside_root() {
        let fx = Fixture::new();
        let root = fx.root();
        let p = resolve_in(&root, &root, "notes.txt", EntryRule::Either).unwrap();
        assert_eq!(p, root.join("notes.txt"));
    }

    #[test]
    fn root_itself_is_inside() {
        let fx = Fixture::new();
        let root = fx.root();
        let p = resolve_in(&root, &root, ".", EntryRule::Directory).unwrap();
        assert_eq!(p, root);
    }

    #[test]
    fn dotdot_traversal_blocked_even_when_target_missing() {
        let fx = Fixture::new();
        let root = fx.root();
        let raw = format!("..{SEP}..{SEP}secret");
        assert_eq!(
            resolve_in(&root, &root, &raw, EntryRule::Either),
            Err(SandboxViolation::OutsideRoot)
        );
    }

    #[test]
    fn traversal_that_returns_inside_is_allowed() {
        let fx = Fixture::new();
        let root = fx.root();
        std::fs::create_dir(root.join("sub")).unwrap();
        let cwd = root.join("sub");
        let p = resolve_in(&root, &cwd, "../sub/../a.txt", EntryRule::File).unwrap();
        assert_eq!(p, root.join("a.txt"));
    }

    #[test]
    fn absolute_path_outside_blocked() {
        let fx = Fixture::new();
        let root = fx.root();
        let outside = fx.outside_dir();
        let raw = outside.to_string_lossy().into_owned();
        assert_eq!(
            resolve_in(&root, &root, &raw, EntryRule::Either),
            Err(SandboxViolation::OutsideRoot)
        );
    }

    #[test]
    fn absolute_path_inside_allowed() {
        let fx = Fixture::new();
        let root = fx.root();
        let raw = root.join("x.txt").to_string_lossy().into_owned();
        let p = resolve_in(&root, &root, &raw, EntryRule::File).unwrap();
        assert_eq!(p, root.join("x.txt"));
    }

    #[test]
    fn sibling_sharing_name_prefix_blocked() {
        let fx = Fixture::new();
        let root = fx.root();
        let sibling = format!("..{SEP}files2{SEP}x.txt");
        std::fs::create_dir(root.parent().unwrap().join("files2")).unwrap();
        assert_eq!(
            resolve_in(&root, &root, &sibling, EntryRule::Either),
            Err(SandboxViolation::OutsideRoot)
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_blocked() {
        let fx = Fixture::new();
        let root = fx.root();
        std::os::unix::fs::symlink(fx.outside_dir(), root.join("link")).unwrap();
        assert_eq!(
            resolve_in(&root, &root, "link/secret.txt", EntryRule::Either),
            Err(SandboxViolation::OutsideRoot)
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_escape_blocked() {
        let fx = Fixture::new();
        let root = fx.root();
        let target = fx.outside_dir().join("pwned.txt");
        std::os::unix::fs::symlink(&target, root.join("evil")).unwrap();
        std::os::unix::fs::symlink("evil", root.join("hop")).unwrap();
        for raw in ["evil", "hop", "evil/deeper.txt"] {
            assert_eq!(
                resolve_in(&root, &root, raw, EntryRule::File),
                Err(SandboxViolation::OutsideRoot),
                "{raw}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_inside_root_resolves_to_target() {
        let fx = Fixture::new();
        let root = fx.root();
        std::os::unix::fs::symlink("later.txt", root.join("alias")).unwrap();
        assert_eq!(
            resolve_in(&root, &root, "alias", EntryRule::File),
            Ok(root.join("later.txt"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_terminates() {
        let fx = Fixture::new();
        let root = fx.root();
        std::os::unix::fs::symlink("b", root.join("a")).unwrap();
        std::os::unix::fs::symlink("a", root.join("b")).unwrap();
        assert!(resolve_in(&root, &root, "a", EntryRule::Either).is_ok());
    }

    #[test]
    fn file_rule_rejects_existing_directory() {
        let fx = Fixture::new();
        let root = fx.root();
        std::fs::create_dir(root.join("dir")).unwrap();
        assert_eq!(
            resolve_in(&root, &root, "dir", EntryRule::File),
            Err(SandboxViolation::DirectoryNotAllowed)
        );
    }

    #[test]
    fn directory_rule_rejects_existing_file() {
        let fx = Fixture::new();
        let root = fx.root();
        std::fs::write(root.join("f.txt"), "x").unwrap();
        assert_eq!(
            resolve_in(&root, &root, "f.txt", EntryRule::Directory),
            Err(SandboxViolation::FileNotAllowed)
        );
    }

    #[test]
    fn missing_target_passes_any_rule() {
        let fx = Fixture::new();
        let root = fx.root();
        for rule in [EntryRule::File, EntryRule::Directory, EntryRule::Either] {
            assert!(resolve_in(&root, &root, "new/deeper/thing", rule).is_ok());
        }
    }

    #[test]
    fn normalize_folds_components() {
        let p = normalize(Path::new("/a/./b/../c"));
        assert_eq!(p, PathBuf::from("/a/c"));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_clamps_at_filesystem_root() {
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn entry_rule_flags() {
        assert!(EntryRule::File.allows_file());
        assert!(!EntryRule::File.allows_dir());
        assert!(!EntryRule::Directory.allows_file());
        assert!(EntryRule::Either.allows_file() && EntryRule::Either.allows_dir());
    }

    proptest! {
        #[test]
        fn resolution_never_escapes_root(
            parts in proptest::collection::vec(
                prop_oneof![Just(".."), Just("."), Just("a"), Just("b"), Just("sub")],
                0..8,
            )
        ) {
            let fx = Fixture::new();
            let root = fx.root();
            std::fs::create_dir_all(root.join("sub")).unwrap();
            let cwd = root.join("sub");
            let raw = parts.join(&SEP.to_string());
            match resolve_in(&root, &cwd, &raw, EntryRule::Either) {
                Ok(p) => prop_assert!(p.starts_with(&root)),
                Err(v) => prop_assert_eq!(v, SandboxViolation::OutsideRoot),
            }
        }
    }
}
