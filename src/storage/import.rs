//! Import of the lifecycle spreadsheet (CSV export) into storage.
//!
//! Source sheets are hand-maintained and their headers drift: cells contain
//! embedded newlines, doubled spaces, trailing spaces, and the description
//! column appears under more than one name. Headers are normalized before
//! columns are matched against the aliases below.

use super::{Storage, clear_taxonomy, ensure_stage, insert_substage, insert_tool};
use crate::models::{normalize_stage_name, split_exemplars};
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const STAGE_COLUMNS: &[&str] = &["RESEARCH DATA LIFECYCLE STAGE"];
const SUBSTAGE_COLUMNS: &[&str] = &["TOOL CATEGORY TYPE"];
const DESCRIPTION_COLUMNS: &[&str] = &["DESCRIPTION (1 SENTENCE)", "DESCRIPTION"];
const EXAMPLES_COLUMNS: &[&str] = &["EXAMPLES"];

/// Summary of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Stages that did not exist before the import
    pub stages_created: usize,
    pub substages: usize,
    pub tools: usize,
    /// Rows without a stage
    pub skipped_rows: usize,
}

/// Column indexes resolved from the header row.
#[derive(Debug)]
struct Columns {
    stage: usize,
    substage: usize,
    description: usize,
    examples: usize,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| -> Result<usize> {
            aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias))
                .ok_or_else(|| {
                    Error::InvalidInput(format!("Missing required column: {}", aliases[0]))
                })
        };

        Ok(Self {
            stage: find(STAGE_COLUMNS)?,
            substage: find(SUBSTAGE_COLUMNS)?,
            description: find(DESCRIPTION_COLUMNS)?,
            examples: find(EXAMPLES_COLUMNS)?,
        })
    }
}

/// Normalize a header cell: strip a byte-order mark, collapse all whitespace
/// (including embedded newlines) to single spaces, and uppercase.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

impl Storage {
    /// Import a lifecycle CSV file.
    pub fn import_csv_file(&mut self, path: &Path, replace: bool) -> Result<ImportReport> {
        let file = File::open(path)?;
        let report = self.import_csv(file, replace)?;
        tracing::info!(
            path = %path.display(),
            replace,
            stages_created = report.stages_created,
            substages = report.substages,
            tools = report.tools,
            skipped_rows = report.skipped_rows,
            "imported lifecycle sheet"
        );
        Ok(report)
    }

    /// Import lifecycle rows from CSV data.
    ///
    /// Each row becomes one substage; each comma-separated exemplar becomes
    /// one tool under the row's stage. With `replace`, existing substages and
    /// tools are removed first. The clear and the inserts share one
    /// transaction, so a failed import leaves the database untouched.
    pub fn import_csv<R: Read>(&mut self, reader: R, replace: bool) -> Result<ImportReport> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = Columns::resolve(rdr.headers()?)?;

        let tx = self.conn.transaction()?;
        if replace {
            clear_taxonomy(&tx)?;
        }
        let mut report = ImportReport::default();
        let now = Utc::now();

        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            let stage = normalize_stage_name(field(columns.stage));
            if stage.is_empty() {
                tracing::warn!(row = line + 2, "skipping row without a stage");
                report.skipped_rows += 1;
                continue;
            }

            if ensure_stage(&tx, &stage)? {
                report.stages_created += 1;
            }

            let substage = field(columns.substage);
            let description = field(columns.description);
            let examples = field(columns.examples);

            if substage.is_empty() {
                tracing::warn!(row = line + 2, stage = %stage, "row has no substage name");
            }
            insert_substage(&tx, substage, description, examples, &stage)?;
            report.substages += 1;

            for tool in split_exemplars(examples) {
                insert_tool(&tx, &tool, description, "", "", &stage, now)?;
                report.tools += 1;
            }
        }

        tx.commit()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    const SHEET: &str = "\
RESEARCH DATA LIFECYCLE STAGE,TOOL CATEGORY TYPE ,\"DESCRIPTION
(1 SENTENCE)\",EXAMPLES
COLLECT,Survey platforms,Collect responses online,\"REDCap, Qualtrics\"
collect,Lab notebooks,Record experiments,eLabFTW
ANALYSE,Notebooks,Interactive analysis,\"Jupyter, RStudio,\"
,Orphans,No stage here,Nothing
";

    #[test]
    fn test_normalize_header() {
        assert_eq!(
            normalize_header("DESCRIPTION\n(1  SENTENCE) "),
            "DESCRIPTION (1 SENTENCE)"
        );
        assert_eq!(normalize_header("\u{feff}examples"), "EXAMPLES");
        assert_eq!(normalize_header("TOOL CATEGORY TYPE "), "TOOL CATEGORY TYPE");
    }

    #[test]
    fn test_import_populates_substages_and_tools() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let report = storage.import_csv(SHEET.as_bytes(), false).unwrap();
        assert_eq!(report.stages_created, 0);
        assert_eq!(report.substages, 3);
        assert_eq!(report.tools, 5);
        assert_eq!(report.skipped_rows, 1);

        let collect = storage.list_substages(Some("COLLECT")).unwrap();
        assert_eq!(collect.len(), 2);
        assert_eq!(collect[0].exemplars(), vec!["REDCap", "Qualtrics"]);

        let tools: Vec<_> = storage
            .list_tools(Some("ANALYSE"))
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(tools, vec!["Jupyter", "RStudio"]);
    }

    #[test]
    fn test_import_tools_carry_row_description() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        storage.import_csv(SHEET.as_bytes(), false).unwrap();

        let tools = storage.list_tools(Some("COLLECT")).unwrap();
        assert_eq!(tools[0].description, "Collect responses online");
        assert!(tools[0].link.is_empty());
        assert!(tools[0].provider.is_empty());
    }

    #[test]
    fn test_import_creates_missing_stages() {
        let mut storage = Storage::in_memory().unwrap();
        let report = storage.import_csv(SHEET.as_bytes(), false).unwrap();
        assert_eq!(report.stages_created, 2);

        let stage = storage.get_stage("ANALYSE").unwrap();
        assert_eq!(stage.position, 6);
        assert!(!stage.description.is_empty());
    }

    #[test]
    fn test_import_accepts_plain_description_column() {
        let sheet = "\
Research Data Lifecycle Stage,Tool Category Type,Description,Examples
PUBLISH,Repositories,Deposit datasets,\"Zenodo, Dryad\"
";
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let report = storage.import_csv(sheet.as_bytes(), false).unwrap();
        assert_eq!(report.substages, 1);
        assert_eq!(report.tools, 2);
    }

    #[test]
    fn test_import_missing_column_is_rejected() {
        let sheet = "RESEARCH DATA LIFECYCLE STAGE,EXAMPLES\nPLAN,DMPonline\n";
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let err = storage.import_csv(sheet.as_bytes(), false).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("TOOL CATEGORY TYPE")));
        assert_eq!(storage.counts().unwrap().tools, 0);
    }

    #[test]
    fn test_import_file() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        let path = env.write_csv("sheet.csv", SHEET);

        let report = storage.import_csv_file(&path, false).unwrap();
        assert_eq!(report.tools, 5);
    }

    #[test]
    fn test_import_keeps_row_without_substage_name() {
        let sheet = "\
RESEARCH DATA LIFECYCLE STAGE,TOOL CATEGORY TYPE,DESCRIPTION,EXAMPLES
STORE,,Keep files safe,\"Backblaze, rsync\"
STORE,Object storage,Bucket storage,S3
";
        let env = TestEnv::new();
        let mut storage = env.init_storage();

        let report = storage.import_csv(sheet.as_bytes(), false).unwrap();
        assert_eq!(report.substages, 2);
        assert_eq!(report.tools, 3);
        assert_eq!(report.skipped_rows, 0);

        let substages = storage.list_substages(Some("STORE")).unwrap();
        assert_eq!(substages.len(), 2);
        assert!(substages.iter().any(|s| s.name.is_empty()
            && s.exemplars() == vec!["Backblaze", "rsync"]));
    }

    #[test]
    fn test_replace_import_clears_existing_taxonomy() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        storage.import_csv(SHEET.as_bytes(), false).unwrap();

        let sheet = "\
RESEARCH DATA LIFECYCLE STAGE,TOOL CATEGORY TYPE,DESCRIPTION,EXAMPLES
PUBLISH,Repositories,Deposit datasets,Zenodo
";
        let report = storage.import_csv(sheet.as_bytes(), true).unwrap();
        assert_eq!(report.tools, 1);

        let counts = storage.counts().unwrap();
        assert_eq!(counts.substages, 1);
        assert_eq!(counts.tools, 1);
        assert_eq!(counts.stages, 12);
        assert_eq!(counts.connections, 15);
    }

    #[test]
    fn test_failed_replace_import_keeps_existing_rows() {
        let env = TestEnv::new();
        let mut storage = env.init_storage();
        storage.import_csv(SHEET.as_bytes(), false).unwrap();
        let before = storage.counts().unwrap();

        // Missing column fails before anything is cleared
        let missing = "RESEARCH DATA LIFECYCLE STAGE,EXAMPLES\nPLAN,DMPonline\n";
        assert!(storage.import_csv(missing.as_bytes(), true).is_err());
        assert_eq!(storage.counts().unwrap(), before);

        // A bad record fails after the clear and rolls it back
        let broken = b"RESEARCH DATA LIFECYCLE STAGE,TOOL CATEGORY TYPE,DESCRIPTION,EXAMPLES\nPLAN,Plans,\xff\xfe,DMPTool\n";
        assert!(storage.import_csv(&broken[..], true).is_err());
        assert_eq!(storage.counts().unwrap(), before);
    }
}
