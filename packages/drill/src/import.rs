//! Spreadsheet import
//!
//! Converts an Excel workbook or a CSV export of the word list into the JSON
//! catalog format. Header names may be English, Japanese or Chinese.

use std::cmp::Ordering;
use std::fs;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use serde_json::Value;
use tango_algo::sanitize::coerce_integer;
use tango_algo::{Catalog, WordEntry};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("no word column found (expected one of: {})", WORD_COLUMNS.join(", "))]
    MissingWordColumn,
}

// 列名候选，按优先级排列
const WORD_COLUMNS: &[&str] = &["单词", "単語", "word", "Word", "WORD"];
const POS_COLUMNS: &[&str] = &["词性", "品詞", "pos", "POS"];
const PHONETIC_COLUMNS: &[&str] = &["音标", "phonetic", "Phonetic"];
const MEANING_COLUMNS: &[&str] = &["词义", "意味", "meaning", "Meaning"];
const EXAMPLE_COLUMNS: &[&str] = &["例句", "例文", "example", "Example"];
const POSITION_COLUMNS: &[&str] =
    &["单词量", "単語量", "单词量位置", "位置", "position", "Position"];

/// Extensions read through the workbook reader; everything else is CSV
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Data rows read from the sheet
    pub rows: usize,
    /// Rows dropped for an empty word
    pub skipped: usize,
    /// Entries written after de-duplication
    pub written: usize,
}

type Row = Vec<String>;

struct ColumnMap {
    word: usize,
    pos: Option<usize>,
    phonetic: Option<usize>,
    meaning: Option<usize>,
    example: Option<usize>,
    position: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self, ImportError> {
        let pick = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|name| headers.iter().position(|h| h == name))
        };
        Ok(Self {
            word: pick(WORD_COLUMNS).ok_or(ImportError::MissingWordColumn)?,
            pos: pick(POS_COLUMNS),
            phonetic: pick(PHONETIC_COLUMNS),
            meaning: pick(MEANING_COLUMNS),
            example: pick(EXAMPLE_COLUMNS),
            position: pick(POSITION_COLUMNS),
        })
    }

    /// `None` for rows without a usable word
    fn entry(&self, row: &[String]) -> Option<WordEntry> {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let word = cell(Some(self.word));
        if word.is_empty() || word.eq_ignore_ascii_case("nan") {
            return None;
        }

        Some(WordEntry {
            word,
            pos: cell(self.pos),
            phonetic: cell(self.phonetic),
            meaning: cell(self.meaning),
            example: cell(self.example),
            position: coerce_integer(Some(&Value::String(cell(self.position)))),
        })
    }
}

/// Shared tail of every format: alias lookup, row filtering, dedup, sort
///
/// Duplicate words keep the last row. Entries with a position come first in
/// position order, then the rest by case-insensitive word.
fn collect_entries<I>(
    headers: &[String],
    rows: I,
) -> Result<(Vec<WordEntry>, ImportReport), ImportError>
where
    I: IntoIterator<Item = Result<Row, ImportError>>,
{
    let headers: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let columns = ColumnMap::resolve(&headers)?;

    let mut total = 0;
    let mut skipped = 0;
    let mut entries = Vec::new();
    for row in rows {
        let row = row?;
        total += 1;
        match columns.entry(&row) {
            Some(entry) => entries.push(entry),
            None => skipped += 1,
        }
    }

    let mut entries: Vec<WordEntry> = Catalog::new(entries).iter().cloned().collect();
    entries.sort_by(catalog_order);

    let report = ImportReport {
        rows: total,
        skipped,
        written: entries.len(),
    };
    Ok((entries, report))
}

fn catalog_order(a: &WordEntry, b: &WordEntry) -> Ordering {
    match (a.position, b.position) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.word.to_lowercase().cmp(&b.word.to_lowercase()))
}

/// Parse CSV rows into catalog entries, sorted for output
pub fn parse_csv<R: Read>(reader: R) -> Result<(Vec<WordEntry>, ImportReport), ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Row = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader.records().map(|record| {
        record
            .map(|r| r.iter().map(str::to_string).collect::<Row>())
            .map_err(ImportError::from)
    });
    collect_entries(&headers, rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// Parse the first worksheet of a workbook; its first row holds the headers
pub fn parse_workbook(path: &Path) -> Result<(Vec<WordEntry>, ImportReport), ImportError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoWorksheet)??;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Row>());
    let headers = rows.next().unwrap_or_default();
    collect_entries(&headers, rows.map(Ok::<Row, ImportError>))
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Convert `input` (workbook by extension, CSV otherwise) into a
/// pretty-printed JSON catalog at `output`
pub fn import_sheet(input: &Path, output: &Path) -> Result<ImportReport, ImportError> {
    let (entries, report) = if is_workbook(input) {
        parse_workbook(input)?
    } else {
        parse_csv(fs::File::open(input)?)?
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, serde_json::to_vec_pretty(&entries)?)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = report.rows,
        skipped = report.skipped,
        written = report.written,
        "word list imported"
    );
    Ok(report)
}
