/// Directory inputs: one query per file, and background corpora given as a file or a directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::MineError;
use super::concatenated::RecordGroup;
use super::{read_records, ColumnLayout};

/// Regular, non-hidden files of a directory, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, MineError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_file() && !hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read one file as the records of a single query named after the file.
///
/// Returns the group and the number of skipped lines.
pub fn read_query_file(
    path: &Path,
    layout: &ColumnLayout,
) -> Result<(RecordGroup, usize), MineError> {
    let name = file_name(path);
    let reader = BufReader::new(File::open(path)?);
    let (records, skipped) = read_records(reader, layout, &name)?;
    Ok((RecordGroup { query: name, records }, skipped))
}

/// Read a background corpus: every file of a directory, or a single file.
pub fn read_background(
    path: &Path,
    layout: &ColumnLayout,
) -> Result<(Vec<RecordGroup>, usize), MineError> {
    let files = if path.is_dir() {
        list_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    let mut groups = Vec::with_capacity(files.len());
    let mut skipped = 0;
    for file in files {
        let (group, file_skipped) = read_query_file(&file, layout)?;
        tracing::debug!(
            file = %file.display(),
            records = group.records.len(),
            "Read background file"
        );
        skipped += file_skipped;
        groups.push(group);
    }
    Ok((groups, skipped))
}

/// Output path of a per-file query: `<output_dir>/prediction_<name>`.
pub fn prediction_path(output_dir: &Path, query: &str) -> PathBuf {
    output_dir.join(format!("prediction_{}", query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnsConfig;

    #[test]
    fn test_list_files_sorted_and_visible_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.tab"), "x").expect("write");
        std::fs::write(dir.path().join("a.tab"), "x").expect("write");
        std::fs::write(dir.path().join(".hidden"), "x").expect("write");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        let names: Vec<String> = list_files(dir.path())
            .expect("list")
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a.tab", "b.tab"]);
    }

    #[test]
    fn test_query_file_named_after_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Q7");
        std::fs::write(&path, "Q7\tkinase domain\nQ7\tzinc finger\n").expect("write");
        let layout = ColumnLayout::per_file(&ColumnsConfig::default());
        let (group, skipped) = read_query_file(&path, &layout).expect("read");
        assert_eq!(group.query, "Q7");
        assert_eq!(group.records.len(), 2);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_background_from_single_file_or_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("one"), "hypothetical protein\nkinase\n").expect("write");
        std::fs::write(dir.path().join("two"), "zinc finger\n").expect("write");
        let layout = ColumnLayout::background(&ColumnsConfig::default());

        let (groups, _) = read_background(dir.path(), &layout).expect("dir");
        assert_eq!(groups.len(), 2);

        let (groups, _) = read_background(&dir.path().join("one"), &layout).expect("file");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].records.len(), 2);
    }

    #[test]
    fn test_prediction_path() {
        assert_eq!(
            prediction_path(Path::new("/out"), "Q1.tab"),
            PathBuf::from("/out/prediction_Q1.tab")
        );
    }
}
