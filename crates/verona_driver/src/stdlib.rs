use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Name of the standard library directory, found next to the executable.
pub const STDLIB_DIR: &str = "stdlib";

#[derive(thiserror::Error, Debug)]
pub enum PathResolutionError {
    #[error("couldn't determine the location of the running executable")]
    CurrentExe(#[source] io::Error),

    #[error("executable path `{}` has no parent directory", .0.display())]
    NoParent(PathBuf),

    #[error("couldn't find the standard library at `{}`", path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Locates `dir_name` next to the running executable.
pub fn locate(dir_name: &str) -> Result<PathBuf, PathResolutionError> {
    let exe = env::current_exe().map_err(PathResolutionError::CurrentExe)?;
    stdlib_path(&exe, dir_name)
}

/// The canonical path of `dir_name` in the directory containing `exe`.
/// Symbolic links and relative components are resolved, so the result does
/// not depend on how the executable was invoked.
pub fn stdlib_path(exe: &Path, dir_name: &str) -> Result<PathBuf, PathResolutionError> {
    let exe_dir = exe
        .parent()
        .ok_or_else(|| PathResolutionError::NoParent(exe.to_owned()))?;

    let path = exe_dir.join(dir_name);
    fs::canonicalize(&path).map_err(|source| PathResolutionError::Canonicalize { path, source })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use temp_dir::TempDir;

    use super::{stdlib_path, PathResolutionError, STDLIB_DIR};

    fn install() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.child("bin").join(STDLIB_DIR)).unwrap();
        dir
    }

    #[test]
    fn next_to_executable() {
        let dir = install();
        let exe = dir.child("bin").join("veronac");

        let expected = fs::canonicalize(dir.child("bin").join(STDLIB_DIR)).unwrap();
        assert_eq!(stdlib_path(&exe, STDLIB_DIR).unwrap(), expected);
    }

    #[test]
    fn relative_components_are_resolved() {
        let dir = install();
        fs::create_dir(dir.child("other")).unwrap();

        let direct = stdlib_path(&dir.child("bin").join("veronac"), STDLIB_DIR).unwrap();
        let indirect = stdlib_path(
            &dir.child("other").join("../bin/./veronac"),
            STDLIB_DIR,
        )
        .unwrap();

        assert_eq!(direct, indirect);
        assert!(direct.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_resolved() {
        let dir = install();
        std::os::unix::fs::symlink(dir.child("bin"), dir.child("link")).unwrap();

        let direct = stdlib_path(&dir.child("bin").join("veronac"), STDLIB_DIR).unwrap();
        let linked = stdlib_path(&dir.child("link").join("veronac"), STDLIB_DIR).unwrap();

        assert_eq!(direct, linked);
    }

    #[test]
    fn missing_directory() {
        let dir = TempDir::new().unwrap();

        let err = stdlib_path(&dir.child("veronac"), STDLIB_DIR).unwrap_err();
        assert!(matches!(err, PathResolutionError::Canonicalize { .. }));
    }

    #[test]
    fn missing_directory_message_names_the_cause() {
        let dir = TempDir::new().unwrap();

        let err = stdlib_path(&dir.child("veronac"), STDLIB_DIR).unwrap_err();
        let message = format!("{:#}", anyhow::Error::from(err));

        assert!(
            message.starts_with("couldn't find the standard library at `"),
            "{message}"
        );
        assert!(message.contains("stdlib`: "), "{message}");
    }

    #[test]
    fn no_parent() {
        let err = stdlib_path(Path::new(""), STDLIB_DIR).unwrap_err();
        assert!(matches!(err, PathResolutionError::NoParent(_)));
    }
}
