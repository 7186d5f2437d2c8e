use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::error::{Result, RouteXmlError};
use crate::options::ConvertOptions;

/// Resolve every input source into a deduplicated, order-stable file list.
///
/// Explicit patterns come first, each expanded on its own, followed by the
/// `--dir` scan. Fails with [`RouteXmlError::NoInput`] when nothing matched.
pub fn collect_input_files(options: &ConvertOptions) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();

    for pattern in &options.inputs {
        candidates.extend(expand_pattern(pattern));
    }

    if let Some(dir) = &options.dir {
        candidates.extend(scan_directory(dir, &options.pattern, options.recursive));
    }

    let files = dedup_paths(candidates);
    if files.is_empty() {
        return Err(RouteXmlError::NoInput);
    }

    debug!(count = files.len(), "resolved input files");
    Ok(files)
}

/// Expand one explicit path or glob pattern.
///
/// A string that is not a valid glob but names an existing path is used as is;
/// any other invalid pattern matches nothing.
pub fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => collect_matches(paths),
        Err(_) if Path::new(pattern).exists() => vec![PathBuf::from(pattern)],
        Err(e) => {
            warn!(pattern, error = %e, "invalid pattern matches no files");
            Vec::new()
        }
    }
}

/// Match `file_pattern` inside `dir`, descending into subdirectories when `recursive`.
pub fn scan_directory(dir: &Path, file_pattern: &str, recursive: bool) -> Vec<PathBuf> {
    let base = Pattern::escape(&dir.to_string_lossy());
    let full = if recursive {
        format!("{base}/**/{file_pattern}")
    } else {
        format!("{base}/{file_pattern}")
    };

    match glob::glob(&full) {
        Ok(paths) => collect_matches(paths),
        Err(e) => {
            warn!(pattern = file_pattern, error = %e, "invalid pattern matches no files");
            Vec::new()
        }
    }
}

fn collect_matches(paths: glob::Paths) -> Vec<PathBuf> {
    paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(path = %e.path().display(), error = %e.error(), "cannot read directory entry");
                None
            }
        })
        .collect()
}

/// Drop repeated paths, comparing lexically normalized forms and keeping the
/// first occurrence. `.` components are removed, so `./a.xml` and `a.xml` are
/// the same file.
pub fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(|p| {
            p.components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect::<PathBuf>()
        })
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("a.xml"), "<Document/>").unwrap();
        fs::write(root.join("b.xml"), "<Document/>").unwrap();
        fs::write(root.join("notes.txt"), "text").unwrap();
        fs::write(root.join("sub/c.xml"), "<Document/>").unwrap();
        fs::write(root.join("sub/deeper/d.xml"), "<Document/>").unwrap();
        fs::write(root.join("sub/deeper/e.kml"), "<Document/>").unwrap();

        temp_dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    fn dir_options(dir: &Path, recursive: bool) -> ConvertOptions {
        ConvertOptions {
            dir: Some(dir.to_path_buf()),
            recursive,
            ..Default::default()
        }
    }

    #[test]
    fn test_scan_directory_flat() {
        let temp_dir = create_test_directory();
        let files = collect_input_files(&dir_options(temp_dir.path(), false)).unwrap();
        assert_eq!(names(&files), vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_scan_directory_recursive() {
        let temp_dir = create_test_directory();
        let mut found = names(&collect_input_files(&dir_options(temp_dir.path(), true)).unwrap());
        found.sort();
        assert_eq!(found, vec!["a.xml", "b.xml", "c.xml", "d.xml"]);
    }

    #[test]
    fn test_custom_pattern() {
        let temp_dir = create_test_directory();
        let options = ConvertOptions {
            pattern: "*.kml".to_string(),
            ..dir_options(temp_dir.path(), true)
        };
        let files = collect_input_files(&options).unwrap();
        assert_eq!(names(&files), vec!["e.kml"]);
    }

    #[test]
    fn test_explicit_patterns_then_directory_deduplicated() {
        let temp_dir = create_test_directory();
        let root = temp_dir.path();
        let options = ConvertOptions {
            inputs: vec![
                root.join("b.xml").to_string_lossy().to_string(),
                format!("{}/./b.xml", root.display()),
                root.join("sub/*.xml").to_string_lossy().to_string(),
            ],
            ..dir_options(root, false)
        };

        let files = collect_input_files(&options).unwrap();
        assert_eq!(names(&files), vec!["b.xml", "c.xml", "a.xml"]);
    }

    #[test]
    fn test_missing_literal_path_matches_nothing() {
        let temp_dir = create_test_directory();
        let missing = temp_dir.path().join("missing.xml");
        assert!(expand_pattern(&missing.to_string_lossy()).is_empty());
    }

    #[test]
    fn test_no_input_is_error() {
        let temp_dir = create_test_directory();
        let options = ConvertOptions {
            inputs: vec![temp_dir.path().join("*.json").to_string_lossy().to_string()],
            ..Default::default()
        };
        assert!(matches!(
            collect_input_files(&options),
            Err(RouteXmlError::NoInput)
        ));
        assert!(matches!(
            collect_input_files(&ConvertOptions::default()),
            Err(RouteXmlError::NoInput)
        ));
    }

    #[test]
    fn test_invalid_pattern_matches_nothing() {
        assert!(expand_pattern("/no/such/dir/[.xml").is_empty());
    }

    #[test]
    fn test_invalid_pattern_beside_valid_input() {
        let temp_dir = create_test_directory();
        let root = temp_dir.path();
        let options = ConvertOptions {
            inputs: vec![
                root.join("a.xml").to_string_lossy().to_string(),
                root.join("miss[ing.xml").to_string_lossy().to_string(),
            ],
            ..Default::default()
        };
        let files = collect_input_files(&options).unwrap();
        assert_eq!(names(&files), vec!["a.xml"]);
    }

    #[test]
    fn test_invalid_name_taken_literally_when_it_exists() {
        let temp_dir = create_test_directory();
        let odd = temp_dir.path().join("odd[.xml");
        fs::write(&odd, "<Document/>").unwrap();
        assert_eq!(expand_pattern(&odd.to_string_lossy()), vec![odd]);
    }

    #[test]
    fn test_invalid_directory_pattern_matches_nothing() {
        let temp_dir = create_test_directory();
        assert!(scan_directory(temp_dir.path(), "[.xml", false).is_empty());

        let options = ConvertOptions {
            pattern: "[.xml".to_string(),
            ..dir_options(temp_dir.path(), false)
        };
        assert!(matches!(
            collect_input_files(&options),
            Err(RouteXmlError::NoInput)
        ));
    }

    #[test]
    fn test_dedup_paths_normalizes() {
        let paths = vec![
            PathBuf::from("routes/a.xml"),
            PathBuf::from("routes//a.xml"),
            PathBuf::from("./routes/b.xml"),
            PathBuf::from("routes/./a.xml"),
            PathBuf::from("./routes/a.xml"),
            PathBuf::from("routes/b.xml"),
        ];
        assert_eq!(
            dedup_paths(paths),
            vec![PathBuf::from("routes/a.xml"), PathBuf::from("routes/b.xml")]
        );
    }

    #[test]
    fn test_dot_prefixed_duplicate_is_dropped() {
        let paths = vec![PathBuf::from("routes/a.xml"), PathBuf::from("./routes/a.xml")];
        assert_eq!(dedup_paths(paths), vec![PathBuf::from("routes/a.xml")]);
    }
}
