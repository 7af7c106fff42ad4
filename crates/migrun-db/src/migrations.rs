use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use migrun_common::Result;
use regex::Regex;
use tracing::{debug, info, warn};

/// Migration files are expected to start with a sortable sequence or
/// timestamp, e.g. `001_init.sql` or `20240101120000_users.sql`.
static ORDERED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]").expect("static regex"));

/// One migration file read from disk.
///
/// Files are applied in ascending order of `name`, so the file name is the
/// sort key. The content is read once and never modified.
#[derive(Debug, Clone)]
pub struct MigrationFile {
    pub path: PathBuf,
    pub name: String,
    pub sql: String,
}

impl MigrationFile {
    pub fn read(path: &Path) -> Result<Self> {
        let sql = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            name: file_name(path),
            sql,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Find every `*.<extension>` file directly inside `dir`, sorted by file name,
/// and read it.
///
/// A missing directory is treated like an empty one. Any other failure to
/// list the directory or read a listed file is returned as an error.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<MigrationFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("migrations directory {} does not exist, nothing to apply", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|x| x == extension) {
            paths.push(path);
        }
    }
    paths.sort_by_key(|p| file_name(p));

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = MigrationFile::read(&path)?;
        if !ORDERED_PREFIX.is_match(&file.name) {
            warn!(
                "migration {} has no numeric prefix; it is applied in plain name order",
                file.path.display()
            );
        }
        debug!("discovered migration {}", file.path.display());
        files.push(file);
    }

    info!("found {} migration(s) in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(files: &[MigrationFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn sorted_by_name_not_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["003_c.sql", "001_a.sql", "010_d.sql", "002_b.sql"] {
            std::fs::write(dir.path().join(name), format!("-- {name}")).unwrap();
        }

        let files = discover(dir.path(), "sql").unwrap();
        assert_eq!(
            names(&files),
            vec!["001_a.sql", "002_b.sql", "003_c.sql", "010_d.sql"]
        );
        assert_eq!(files[0].sql, "-- 001_a.sql");
        assert_eq!(files[0].path, dir.path().join("001_a.sql"));
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover(&dir.path().join("absent"), "sql").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn filters_by_extension_and_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_a.sql"), "").unwrap();
        std::fs::write(dir.path().join("002_b.txt"), "").unwrap();
        std::fs::write(dir.path().join("003_c.SQL"), "").unwrap();
        std::fs::write(dir.path().join("README"), "").unwrap();
        std::fs::create_dir(dir.path().join("004_nested.sql")).unwrap();

        let files = discover(dir.path(), "sql").unwrap();
        assert_eq!(names(&files), vec!["001_a.sql"]);
    }

    #[test]
    fn custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_a.sql"), "").unwrap();
        std::fs::write(dir.path().join("001_a.up"), "").unwrap();

        let files = discover(dir.path(), "up").unwrap();
        assert_eq!(names(&files), vec!["001_a.up"]);
    }

    #[test]
    fn unprefixed_files_still_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("seed.sql"), "").unwrap();
        std::fs::write(dir.path().join("001_init.sql"), "").unwrap();

        let files = discover(dir.path(), "sql").unwrap();
        assert_eq!(names(&files), vec!["001_init.sql", "seed.sql"]);
    }

    #[test]
    fn prefix_pattern() {
        assert!(ORDERED_PREFIX.is_match("20240101_init.sql"));
        assert!(!ORDERED_PREFIX.is_match("init.sql"));
    }
}
