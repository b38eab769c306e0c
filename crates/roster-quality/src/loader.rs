//! CSV loading with header alias resolution.
//!
//! Every column is read as text so values such as phone numbers and zip-like
//! ids keep their exact spelling; typing happens in the cleaner.

use crate::error::{PipelineError, Result};
use crate::utils::normalize_column_name;
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const LOADER_VERSION: &str = "1.5";

/// Canonical column name and the source headers that map onto it.
///
/// Aliases are matched after trimming and lowercasing.
pub const COLUMN_ALIASES: [(&str, &[&str]); 8] = [
    ("id", &["id"]),
    ("name", &["name"]),
    ("email", &["email"]),
    ("phone", &["phone"]),
    ("salary", &["salary"]),
    ("date_joined", &["date_joined", "date", "joindate", "joiningdate"]),
    ("department", &["department", "dept", "division"]),
    ("notes", &["notes", "remarks", "comments"]),
];

/// Canonical name for a source header.
///
/// ```rust,ignore
/// assert_eq!(canonical_column_name(" JoinDate "), "date_joined");
/// assert_eq!(canonical_column_name("Badge Colour"), "badge_colour");
/// ```
pub fn canonical_column_name(raw: &str) -> String {
    let normalized = normalize_column_name(raw);
    COLUMN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Rename every column of `df` to its canonical name.
///
/// Fails when two headers resolve to the same name, e.g. `Date` and
/// `JoinDate`.
pub fn apply_aliases(df: &mut DataFrame) -> Result<()> {
    let renamed: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|c| canonical_column_name(c))
        .collect();

    let mut seen = HashSet::with_capacity(renamed.len());
    let collisions: BTreeSet<String> = renamed
        .iter()
        .filter(|c| !seen.insert(c.as_str()))
        .cloned()
        .collect();
    if !collisions.is_empty() {
        return Err(PipelineError::DuplicateColumns(collisions.into_iter().collect()));
    }

    df.set_column_names(renamed)?;
    Ok(())
}

/// Load a CSV file with every column as text and canonical headers.
///
/// # Errors
///
/// - [`PipelineError::Io`] when the file does not exist or cannot be read
/// - [`PipelineError::Polars`] when no read strategy can parse it
/// - [`PipelineError::DuplicateColumns`] when aliases collide
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("CSV file not found: {}", path.display()),
        )
        .into());
    }

    let mut df = read_with_fallbacks(path)?;
    apply_aliases(&mut df)?;

    info!(
        file = %path.display(),
        rows = df.height(),
        cols = df.width(),
        version = LOADER_VERSION,
        "CSV loaded"
    );
    Ok(df)
}

fn text_options() -> CsvReadOptions {
    // A zero-length inference window reads every column as String
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
}

fn read_with_fallbacks(path: &Path) -> Result<DataFrame> {
    // Strategy 1: strict UTF-8 with standard quoting
    match text_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: replace undecodable bytes
    match text_options()
        .with_parse_options(CsvParseOptions::default().with_encoding(CsvEncoding::LossyUtf8))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => {
            warn!(file = %path.display(), "Loaded with lossy UTF-8 decoding");
            return Ok(df);
        }
        Err(e) => debug!("Lossy loading failed: {}", e),
    }

    // Strategy 3: pre-clean the content
    let bytes = std::fs::read(path)?;
    let cleaned = clean_csv_content(&String::from_utf8_lossy(&bytes));
    Ok(text_options()
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()?)
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "roster_quality_loader_{}_{}",
            std::process::id(),
            name
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_canonical_column_name() {
        assert_eq!(canonical_column_name("ID"), "id");
        assert_eq!(canonical_column_name(" JoinDate "), "date_joined");
        assert_eq!(canonical_column_name("Date"), "date_joined");
        assert_eq!(canonical_column_name("Dept"), "department");
        assert_eq!(canonical_column_name("Comments"), "notes");
        assert_eq!(canonical_column_name("Badge Colour"), "badge_colour");
    }

    #[test]
    fn test_apply_aliases_collision() {
        let mut df = df! {
            "Date" => ["2023-01-01"],
            "JoinDate" => ["2023-01-02"],
        }
        .unwrap();

        let err = apply_aliases(&mut df).unwrap_err();
        match err {
            PipelineError::DuplicateColumns(cols) => assert_eq!(cols, vec!["date_joined"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_csv_reads_text_and_aliases() {
        let path = write_temp(
            "aliases.csv",
            "ID,Name,Email,Phone,Salary,JoiningDate,Dept\n\
             1,Ann,ann@corp.com,0015550100,\"50,000\",2023-01-15,HR\n",
        );

        let df = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "email", "phone", "salary", "date_joined", "department"]
        );
        for column in df.get_columns() {
            assert_eq!(column.dtype(), &DataType::String);
        }
        // Leading zeros survive because nothing is inferred as a number
        assert_eq!(df.column("phone").unwrap().str().unwrap().get(0), Some("0015550100"));
        assert_eq!(df.column("salary").unwrap().str().unwrap().get(0), Some("50,000"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_csv("no/such/file.csv").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_clean_csv_content() {
        let cleaned = clean_csv_content("a,b\n\n\"\"\"x\"\"\",y\n   \n");
        assert_eq!(cleaned, "a,b\n\"x\",y");
    }
}
