//! CSV input/output: the in-memory input table, the CRM backfill step and
//! the final writer with optional header renames.

use crate::config::CrmBackfillConfig;
use crate::errors::AppError;
use crate::models::{FieldMapping, OutputRow};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// An input CSV held fully in memory: one header row plus rectangular data
/// rows (the reader rejects ragged records).
pub struct InputTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl InputTable {
    pub fn read(path: &Path) -> Result<Self, AppError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|field| field.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = InputRow<'_>> {
        self.rows
            .iter()
            .map(move |values| InputRow::new(&self.headers, values))
    }

    /// Fills blank website cells from the CRM id to domain map. Runs only
    /// when both the salesforce id and website roles are mapped; a row
    /// qualifies when its id cell is non-empty and its website cell is blank.
    /// Returns the number of cells filled.
    pub fn backfill_websites(
        &mut self,
        mapping: &FieldMapping,
        crm_domains: &HashMap<String, String>,
    ) -> usize {
        if crm_domains.is_empty() {
            return 0;
        }
        let (Some(sf_column), Some(website_column)) = (
            mapping.column_for("salesforce_id"),
            mapping.column_for("website"),
        ) else {
            return 0;
        };
        let Some(sf_idx) = self.headers.iter().position(|h| h == sf_column) else {
            tracing::warn!(
                "salesforce id column {:?} not present in the input; skipping backfill",
                sf_column
            );
            return 0;
        };
        let Some(website_idx) = self.headers.iter().position(|h| h == website_column) else {
            tracing::warn!(
                "website column {:?} not present in the input; skipping backfill",
                website_column
            );
            return 0;
        };

        let mut filled = 0;
        for row in &mut self.rows {
            if row[sf_idx].is_empty() || !row[website_idx].trim().is_empty() {
                continue;
            }
            if let Some(domain) = crm_domains.get(&row[sf_idx]) {
                row[website_idx] = domain.clone();
                filled += 1;
            }
        }
        filled
    }
}

/// A borrowed view of one data row keyed by header name.
#[derive(Debug, Clone, Copy)]
pub struct InputRow<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> InputRow<'a> {
    pub fn new(headers: &'a [String], values: &'a [String]) -> Self {
        Self { headers, values }
    }

    /// Cell under the given column, or "" when the column does not exist.
    pub fn get(&self, column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Loads the CRM accounts CSV into an id to domain map. Cells are taken
/// verbatim; a later duplicate id overwrites an earlier one. Unconfigured or
/// missing columns disable the backfill rather than failing the run.
pub fn load_crm_domains(
    path: &Path,
    config: &CrmBackfillConfig,
) -> Result<HashMap<String, String>, AppError> {
    let id_column = config
        .id_column
        .as_deref()
        .filter(|c| !c.trim().is_empty());
    let domain_column = config
        .domain_column
        .as_deref()
        .filter(|c| !c.trim().is_empty());
    let (Some(id_column), Some(domain_column)) = (id_column, domain_column) else {
        tracing::warn!(
            "crm_backfill.id_column and crm_backfill.domain_column are not both set; skipping backfill"
        );
        return Ok(HashMap::new());
    };

    let table = InputTable::read(path)?;
    let Some(id_idx) = table.headers.iter().position(|h| h == id_column) else {
        tracing::warn!(
            "column {:?} not present in {}; skipping backfill",
            id_column,
            path.display()
        );
        return Ok(HashMap::new());
    };
    let Some(domain_idx) = table.headers.iter().position(|h| h == domain_column) else {
        tracing::warn!(
            "column {:?} not present in {}; skipping backfill",
            domain_column,
            path.display()
        );
        return Ok(HashMap::new());
    };

    let mut map = HashMap::new();
    for row in &table.rows {
        map.insert(row[id_idx].clone(), row[domain_idx].clone());
    }
    Ok(map)
}

/// Loads the optional rename map: a JSON object of current column name to
/// desired name. Malformed JSON or a non-object root disables renaming;
/// entries whose target is not a non-empty string are dropped.
pub fn load_rename_map(path: &Path) -> Result<HashMap<String, String>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "invalid rename JSON in {} ({}); ignoring renames",
                path.display(),
                e
            );
            return Ok(HashMap::new());
        }
    };
    let Some(entries) = parsed.as_object() else {
        tracing::warn!(
            "rename JSON in {} is not an object; ignoring renames",
            path.display()
        );
        return Ok(HashMap::new());
    };

    let mut map = HashMap::new();
    for (from, to) in entries {
        match to.as_str() {
            Some(target) if !target.is_empty() => {
                map.insert(from.clone(), target.to_string());
            }
            _ => tracing::warn!(
                "ignoring rename for {:?}: target must be a non-empty string",
                from
            ),
        }
    }
    Ok(map)
}

/// Final column order: the input headers first (when carried through), then
/// every other key that appeared in any row, sorted by name.
pub fn output_columns(
    input_headers: &[String],
    include_input_columns: bool,
    rows: &[OutputRow],
) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut known: BTreeSet<&str> = BTreeSet::new();
    if include_input_columns {
        columns.extend(input_headers.iter().cloned());
        known.extend(input_headers.iter().map(String::as_str));
    }

    let mut extra: BTreeSet<String> = BTreeSet::new();
    for row in rows {
        for key in row.keys() {
            if !known.contains(key.as_str()) {
                extra.insert(key.clone());
            }
        }
    }
    columns.extend(extra);
    columns
}

/// Writes the final CSV. Renames apply to header names only; a rename whose
/// source is not among the columns is ignored. Cells missing from a row
/// render as "".
pub fn write_output(
    path: &Path,
    columns: &[String],
    rename: &HashMap<String, String>,
    rows: &[OutputRow],
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;

    let header: Vec<&str> = columns
        .iter()
        .map(|c| rename.get(c).map(String::as_str).unwrap_or(c.as_str()))
        .collect();
    writer.write_record(&header)?;

    for row in rows {
        let record: Vec<String> = columns.iter().map(|c| render_cell(row.get(c))).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
