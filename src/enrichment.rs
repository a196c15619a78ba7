//! Per-row enrichment: runs both vendors' fallback chains over a row and
//! folds the outcomes into the output columns.

use crate::config::OutputConfig;
use crate::domain::sanitize_domain;
use crate::flatten::flatten_record;
use crate::models::{FieldMapping, LookupOutcome, OutputRow};
use crate::services::{CompanyLookup, CrmLookup};
use crate::table::InputRow;
use serde_json::Value;

/// Reason reported when a vendor's chain never ran because the row carried
/// none of the identifiers that vendor accepts.
pub const NO_CANDIDATES_REASON: &str = "no candidate identifiers provided";

/// Lookup keys pulled from a row through the field mapping, trimmed and with
/// the website already reduced to a bare domain.
#[derive(Debug, Default, PartialEq, Eq)]
struct CandidateFields {
    zoominfo_id: String,
    apollo_id: String,
    salesforce_id: String,
    name: String,
    domain: String,
}

impl CandidateFields {
    fn extract(row: &InputRow<'_>, mapping: &FieldMapping) -> Self {
        let cell = |role: &str| -> String {
            mapping
                .column_for(role)
                .map(|column| row.get(column).trim().to_string())
                .unwrap_or_default()
        };

        Self {
            zoominfo_id: cell("zoominfo_id"),
            apollo_id: cell("apollo_id"),
            salesforce_id: cell("salesforce_id"),
            name: cell("name"),
            domain: sanitize_domain(&cell("website")),
        }
    }
}

/// Enriches one row: each vendor tries its identifier tiers in priority
/// order, stopping at the first record, and the result lands in the output
/// row as `<prefix>_match`, `<prefix>_error` and the flattened record fields.
///
/// Lookup failures never abort the run; they become the row's error column.
pub async fn enrich_row<Z, A>(
    row: &InputRow<'_>,
    mapping: &FieldMapping,
    output: &OutputConfig,
    zoominfo: &Z,
    apollo: &A,
) -> OutputRow
where
    Z: CompanyLookup + Sync,
    A: CrmLookup + Sync,
{
    let mut out = OutputRow::new();
    if output.include_input_columns {
        for (column, value) in row.columns() {
            out.insert(column.to_string(), Value::String(value.to_string()));
        }
    }

    let fields = CandidateFields::extract(row, mapping);

    // ZoomInfo: company id, then domain, then name.
    let mut zi_outcome: Option<LookupOutcome> = None;
    if !fields.zoominfo_id.is_empty() {
        zi_outcome = Some(zoominfo.lookup_by_id(&fields.zoominfo_id).await);
    }
    if !matches!(zi_outcome, Some(Ok(_))) && !fields.domain.is_empty() {
        zi_outcome = Some(zoominfo.lookup_by_domain(&fields.domain).await);
    }
    if !matches!(zi_outcome, Some(Ok(_))) && !fields.name.is_empty() {
        zi_outcome = Some(zoominfo.lookup_by_name(&fields.name).await);
    }

    // Apollo: apollo id, then salesforce id, then domain, then name.
    let mut ap_outcome: Option<LookupOutcome> = None;
    if !fields.apollo_id.is_empty() {
        ap_outcome = Some(apollo.lookup_by_id(&fields.apollo_id).await);
    }
    if !matches!(ap_outcome, Some(Ok(_))) && !fields.salesforce_id.is_empty() {
        ap_outcome = Some(apollo.lookup_by_external_id(&fields.salesforce_id).await);
    }
    if !matches!(ap_outcome, Some(Ok(_))) && !fields.domain.is_empty() {
        ap_outcome = Some(apollo.lookup_by_domain(&fields.domain).await);
    }
    if !matches!(ap_outcome, Some(Ok(_))) && !fields.name.is_empty() {
        ap_outcome = Some(apollo.lookup_by_name(&fields.name).await);
    }

    apply_vendor_outcome(
        &mut out,
        &output.prefix_zoominfo,
        zi_outcome,
        output.add_vendor_json_columns,
    );
    apply_vendor_outcome(
        &mut out,
        &output.prefix_apollo,
        ap_outcome,
        output.add_vendor_json_columns,
    );

    out
}

/// Writes one vendor's columns into the row. Status columns are written
/// first and always win; a flattened record field whose name collides with
/// one of them lands under a `_value` suffix instead.
fn apply_vendor_outcome(
    out: &mut OutputRow,
    prefix: &str,
    outcome: Option<LookupOutcome>,
    add_json_column: bool,
) {
    let match_column = format!("{}_match", prefix);
    let error_column = format!("{}_error", prefix);
    let json_column = format!("{}_json", prefix);

    match outcome {
        Some(Ok(record)) => {
            out.insert(match_column.clone(), Value::Bool(true));
            out.insert(error_column.clone(), Value::String(String::new()));
            if add_json_column {
                out.insert(
                    json_column.clone(),
                    Value::String(serde_json::to_string(&record).unwrap_or_default()),
                );
            }
            for (key, value) in flatten_record(prefix, &record) {
                let reserved = key == match_column
                    || key == error_column
                    || (add_json_column && key == json_column);
                let key = if reserved {
                    format!("{}_value", key)
                } else {
                    key
                };
                out.insert(key, value);
            }
        }
        Some(Err(failure)) => {
            out.insert(match_column, Value::Bool(false));
            out.insert(error_column, Value::String(failure.to_string()));
            if add_json_column {
                out.insert(json_column, Value::String(String::new()));
            }
        }
        None => {
            out.insert(match_column, Value::Bool(false));
            out.insert(
                error_column,
                Value::String(NO_CANDIDATES_REASON.to_string()),
            );
            if add_json_column {
                out.insert(json_column, Value::String(String::new()));
            }
        }
    }
}

/// Whether the vendor with the given prefix matched in this row.
pub fn vendor_matched(row: &OutputRow, prefix: &str) -> bool {
    row.get(&format!("{}_match", prefix)) == Some(&Value::Bool(true))
}
