#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use md_dtypes::{Table, Value};
use tempfile::{TempDir, tempdir};

/// Number of filler columns in [`metadata_csv`]; one more than the default threshold.
pub const FILLER_COLUMNS: usize = 11;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|value| Value::text(*value)).collect()
}

/// `count` four-row columns `var_<i>` holding `first`, `second` and two numbers.
pub fn filler_columns(count: usize, first: &str, second: &str) -> Vec<(String, Vec<Value>)> {
    (0..count)
        .map(|i| {
            (
                format!("var_{i}"),
                vec![
                    Value::text(first),
                    Value::text(second),
                    Value::text(format!("{i}.5")),
                    Value::text("7.25"),
                ],
            )
        })
        .collect()
}

/// Sample metadata where "missing" and "not provided" recur across every filler column.
pub fn metadata_table(first: &str, second: &str) -> Table {
    let mut columns = vec![
        ("sample_name".to_string(), texts(&["s0", "s1", "s2", "s3"])),
        (
            "age".to_string(),
            vec![
                Value::Float(25.0),
                Value::Float(30.0),
                Value::Missing,
                Value::Float(40.0),
            ],
        ),
        (
            "host_diet".to_string(),
            texts(&["missing", "omnivore", "not provided", "herbivore"]),
        ),
        (
            "weight_kg".to_string(),
            texts(&["55.2", "unk", "60.0", "61.5"]),
        ),
    ];
    columns.extend(filler_columns(FILLER_COLUMNS, first, second));
    Table::from_columns(columns).expect("metadata table")
}

/// CSV rendition of `metadata_table("missing", "not provided")`.
pub fn metadata_csv() -> String {
    let mut header = vec![
        "sample_name".to_string(),
        "age".to_string(),
        "host_diet".to_string(),
        "weight_kg".to_string(),
    ];
    header.extend((0..FILLER_COLUMNS).map(|i| format!("var_{i}")));
    let fixed = [
        ["s0", "25", "missing", "55.2"],
        ["s1", "30", "omnivore", "unk"],
        ["s2", "", "not provided", "60.0"],
        ["s3", "40", "herbivore", "61.5"],
    ];
    let mut out = header.join(",");
    out.push('\n');
    for (row_idx, row) in fixed.iter().enumerate() {
        let mut cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        for i in 0..FILLER_COLUMNS {
            cells.push(match row_idx {
                0 => "missing".to_string(),
                1 => "not provided".to_string(),
                2 => format!("{i}.5"),
                _ => "7.25".to_string(),
            });
        }
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
