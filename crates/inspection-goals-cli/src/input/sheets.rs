use calamine::{open_workbook_auto, Data, Reader};
use inspection_goals_core::ingest::{RawRow, RowSource, SheetRef};
use inspection_goals_core::{GoalsError, GoalsResult};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};

const INDEX_SHEET: &str = "ARQUIVOS";
const TARGET_SHEET: &str = "METAS";
const PERIOD_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "ods", "csv", "json"];

/// Spreadsheet exports on the local filesystem.
///
/// The index is a workbook (ARQUIVOS tab, else its first sheet), a CSV or a
/// JSON array. Period sheets are looked up as `<data_dir>/<sheet id>.<ext>`.
/// Target overrides come from `targets` when given, else from the METAS tab
/// of an index workbook.
#[derive(Debug, Clone)]
pub struct LocalSheets {
    pub index: PathBuf,
    pub targets: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl LocalSheets {
    pub fn new(index: impl Into<PathBuf>, targets: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        let index = index.into();
        let data_dir = data_dir.unwrap_or_else(|| {
            index
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });
        LocalSheets {
            index,
            targets,
            data_dir,
        }
    }

    fn period_path(&self, id: &str) -> Option<PathBuf> {
        PERIOD_EXTENSIONS
            .iter()
            .map(|ext| self.data_dir.join(format!("{id}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl RowSource for LocalSheets {
    fn fetch_rows(&self, sheet: &SheetRef) -> GoalsResult<Vec<RawRow>> {
        let rows = match sheet {
            SheetRef::SourceIndex => read_table(&self.index, Some(INDEX_SHEET), true),
            SheetRef::TargetIndex => match &self.targets {
                Some(path) => read_table(path, Some(TARGET_SHEET), true),
                None if is_workbook(&self.index) => read_table(&self.index, Some(TARGET_SHEET), false),
                None => Err("no target table configured".to_string()),
            },
            SheetRef::Period(id) => match self.period_path(id) {
                Some(path) => read_table(&path, None, true),
                None => Err(format!("no export for {id} in {}", self.data_dir.display())),
            },
        };
        rows.map_err(|reason| GoalsError::SourceUnavailable {
            source_name: sheet.to_string(),
            reason,
        })
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn is_workbook(path: &Path) -> bool {
    matches!(extension(path).as_str(), "xlsx" | "xlsm" | "xls" | "ods")
}

/// Rows of a CSV, JSON or workbook file keyed by the header row.
///
/// For workbooks, `sheet` picks a named tab; `fallback_first` allows the
/// first tab when that name is missing.
pub fn read_table(path: &Path, sheet: Option<&str>, fallback_first: bool) -> Result<Vec<RawRow>, String> {
    tracing::debug!(path = %path.display(), ?sheet, "reading table");
    match extension(path).as_str() {
        "csv" => read_csv(path),
        "json" => read_json_rows(path),
        _ if is_workbook(path) => read_workbook(path, sheet, fallback_first),
        other => Err(format!("unsupported file type '{other}'")),
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| {
                let cell = if v.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(v.to_string())
                };
                (h.clone(), cell)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn read_json_rows(path: &Path) -> Result<Vec<RawRow>, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&contents).map_err(|e| format!("expected an array of objects: {e}"))
}

fn read_workbook(path: &Path, sheet: Option<&str>, fallback_first: bool) -> Result<Vec<RawRow>, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| e.to_string())?;
    let names = workbook.sheet_names().to_vec();

    let wanted = sheet.and_then(|s| names.iter().find(|n| n.trim().eq_ignore_ascii_case(s)));
    let name = match (wanted, fallback_first) {
        (Some(n), _) => n.clone(),
        (None, true) => names.first().cloned().ok_or("workbook has no sheets")?,
        (None, false) => return Err(format!("workbook has no {} sheet", sheet.unwrap_or("named"))),
    };

    let range = workbook.worksheet_range(&name).map_err(|e| e.to_string())?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();

    Ok(rows
        .filter(|r| r.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|r| {
            headers
                .iter()
                .zip(r.iter())
                .filter(|(h, _)| !h.is_empty())
                .map(|(h, c)| (h.clone(), cell_value(c)))
                .collect::<Map<String, Value>>()
        })
        .collect())
}

/// Workbook cell as the loosely typed value the ingest layer coerces.
/// Dates stay spreadsheet serials.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(n) => Value::Number((*n).into()),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => float_value(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return Value::Number((f as i64).into());
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
