use crate::constants::VFS_ROOT;
use std::fmt;

/// A normalised location below the virtual root.
///
/// Stored as the list of segments under root, so a `VfsPath` can never
/// name anything above it: `..` at root stays at root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VfsPath {
    segments: Vec<String>,
}

impl VfsPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves `arg` against this path.
    ///
    /// A leading `/` makes `arg` absolute. Empty segments and `.` are skipped,
    /// `..` drops the last segment and saturates at root.
    pub fn resolve(&self, arg: &str) -> VfsPath {
        let mut segments = if arg.starts_with('/') {
            Vec::new()
        } else {
            self.segments.clone()
        };

        for part in arg.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name.to_string()),
            }
        }

        VfsPath { segments }
    }

    pub fn parent(&self) -> VfsPath {
        let mut segments = self.segments.clone();
        segments.pop();
        VfsPath { segments }
    }

    /// Last segment, `None` at root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn join(&self, name: &str) -> VfsPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        VfsPath { segments }
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(VFS_ROOT);
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(VfsPath::root().to_string(), "/");
        assert!(VfsPath::root().is_root());
    }

    #[test]
    fn test_relative_and_absolute() {
        let cwd = VfsPath::root().resolve("music/rock");
        assert_eq!(cwd.to_string(), "/music/rock");
        assert_eq!(cwd.resolve("live").to_string(), "/music/rock/live");
        assert_eq!(cwd.resolve("/photos").to_string(), "/photos");
    }

    #[test]
    fn test_dot_segments() {
        let cwd = VfsPath::root().resolve("a/b");
        assert_eq!(cwd.resolve("..").to_string(), "/a");
        assert_eq!(cwd.resolve("./c/../d").to_string(), "/a/b/d");
        assert_eq!(cwd.resolve("//x///y/").to_string(), "/x/y");
    }

    #[test]
    fn test_never_climbs_above_root() {
        let cwd = VfsPath::root().resolve("a");
        assert!(cwd.resolve("../../..").is_root());
        assert_eq!(cwd.resolve("../../../etc").to_string(), "/etc");
        assert!(VfsPath::root().parent().is_root());
    }

    #[test]
    fn test_names_keep_spaces() {
        let path = VfsPath::root().resolve("My Documents/report final.txt");
        assert_eq!(path.file_name(), Some("report final.txt"));
        assert_eq!(path.parent().to_string(), "/My Documents");
    }
}
