use crate::errors::LookupFailure;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw payload returned by a vendor for one company. No fixed schema; the
/// flattener walks it generically.
pub type VendorRecord = Value;

/// Result of a single lookup attempt: a record, or the reason there is none.
pub type LookupOutcome = Result<VendorRecord, LookupFailure>;

/// One enriched output row keyed by column name. Values stay JSON scalars
/// until they are rendered to CSV cells.
pub type OutputRow = BTreeMap<String, Value>;

/// Binds the five lookup roles to input column names.
///
/// Any role may be unbound; a blank binding counts as unbound. Roles may
/// share a column.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub zoominfo_id: Option<String>,
    pub apollo_id: Option<String>,
    pub salesforce_id: Option<String>,
    pub name: Option<String>,
    pub website: Option<String>,
}

impl FieldMapping {
    /// The five logical roles, in the order they are prompted for.
    pub const ROLES: [&'static str; 5] =
        ["zoominfo_id", "apollo_id", "salesforce_id", "name", "website"];

    /// Column bound to the given role, if any.
    pub fn column_for(&self, role: &str) -> Option<&str> {
        let column = match role {
            "zoominfo_id" => &self.zoominfo_id,
            "apollo_id" => &self.apollo_id,
            "salesforce_id" => &self.salesforce_id,
            "name" => &self.name,
            "website" => &self.website,
            _ => return None,
        };
        column.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Rebinds a role; `None` clears it. Unknown roles are ignored.
    pub fn bind(&mut self, role: &str, column: Option<String>) {
        match role {
            "zoominfo_id" => self.zoominfo_id = column,
            "apollo_id" => self.apollo_id = column,
            "salesforce_id" => self.salesforce_id = column,
            "name" => self.name = column,
            "website" => self.website = column,
            _ => {}
        }
    }

    /// True when no role is bound to any column.
    pub fn is_unbound(&self) -> bool {
        Self::ROLES.iter().all(|role| self.column_for(role).is_none())
    }
}
