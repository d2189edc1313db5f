//! Install-time setup: the custom jurisdiction field on Employee and the
//! filter applied when that field is picked.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::models::Jurisdiction;

/// The document type the custom field is added to.
pub const EMPLOYEE_DOCTYPE: &str = "Employee";

/// The document type holding jurisdictions.
pub const STATE_DOCTYPE: &str = "State";

/// Field name of the employee's jurisdiction link.
pub const STATE_FIELD: &str = "custom_state";

/// Kind of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// A reference to another record; `options` names its document type.
    Link,
    /// Free text.
    Data,
}

/// A field added to a host document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    /// Internal field name.
    pub fieldname: String,
    /// Label shown on the form.
    pub label: String,
    /// Field kind.
    pub fieldtype: FieldType,
    /// For links, the target document type.
    pub options: Option<String>,
    /// The existing field this one is placed after.
    pub insert_after: Option<String>,
    /// Whether a value is mandatory.
    pub reqd: bool,
}

/// Registry of custom fields on host document types.
pub trait FieldRegistry {
    /// Returns true if the document type already has the field.
    fn has_field(&self, doctype: &str, fieldname: &str) -> bool;

    /// Adds a field to a document type.
    fn add_field(&mut self, doctype: &str, field: CustomField) -> EngineResult<()>;
}

/// The `custom_state` link field installed on Employee.
pub fn state_field() -> CustomField {
    CustomField {
        fieldname: STATE_FIELD.to_string(),
        label: "State (PT)".to_string(),
        fieldtype: FieldType::Link,
        options: Some(STATE_DOCTYPE.to_string()),
        insert_after: Some("date_of_birth".to_string()),
        reqd: false,
    }
}

/// Registers the jurisdiction link field on Employee.
///
/// Returns true if the field was created, false if it already existed.
/// Running it again is a no-op.
pub fn after_install<R: FieldRegistry + ?Sized>(registry: &mut R) -> EngineResult<bool> {
    if registry.has_field(EMPLOYEE_DOCTYPE, STATE_FIELD) {
        debug!(
            doctype = EMPLOYEE_DOCTYPE,
            fieldname = STATE_FIELD,
            "Custom field already installed"
        );
        return Ok(false);
    }

    registry.add_field(EMPLOYEE_DOCTYPE, state_field())?;
    info!(
        doctype = EMPLOYEE_DOCTYPE,
        fieldname = STATE_FIELD,
        "Installed custom field"
    );
    Ok(true)
}

/// A single `[doctype, field, operator, value]` link-query condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFilter(pub String, pub String, pub String, pub u8);

/// Conditions a record must meet to be selectable in a link field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkQuery {
    /// All conditions; every one must hold.
    pub filters: Vec<LinkFilter>,
}

impl LinkQuery {
    /// Returns true if the jurisdiction passes every filter.
    ///
    /// Only `docstatus` equality is understood; any other condition rejects.
    pub fn matches(&self, jurisdiction: &Jurisdiction) -> bool {
        self.filters.iter().all(|LinkFilter(doctype, field, op, value)| {
            doctype == STATE_DOCTYPE
                && field == "docstatus"
                && op == "="
                && jurisdiction.docstatus.code() == *value
        })
    }
}

/// The query applied to the `custom_state` picker: submitted states only.
///
/// # Example
///
/// ```
/// use professional_tax::install::state_link_filters;
///
/// let json = serde_json::to_string(&state_link_filters()).unwrap();
/// assert_eq!(json, r#"{"filters":[["State","docstatus","=",1]]}"#);
/// ```
pub fn state_link_filters() -> LinkQuery {
    LinkQuery {
        filters: vec![LinkFilter(
            STATE_DOCTYPE.to_string(),
            "docstatus".to_string(),
            "=".to_string(),
            1,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocStatus;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Registry {
        fields: HashMap<String, Vec<CustomField>>,
    }

    impl FieldRegistry for Registry {
        fn has_field(&self, doctype: &str, fieldname: &str) -> bool {
            self.fields
                .get(doctype)
                .is_some_and(|fields| fields.iter().any(|f| f.fieldname == fieldname))
        }

        fn add_field(&mut self, doctype: &str, field: CustomField) -> EngineResult<()> {
            self.fields.entry(doctype.to_string()).or_default().push(field);
            Ok(())
        }
    }

    #[test]
    fn test_after_install_adds_state_link() {
        let mut registry = Registry::default();
        assert!(after_install(&mut registry).unwrap());

        let fields = &registry.fields["Employee"];
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].fieldname, "custom_state");
        assert_eq!(fields[0].fieldtype, FieldType::Link);
        assert_eq!(fields[0].options.as_deref(), Some("State"));
        assert_eq!(fields[0].insert_after.as_deref(), Some("date_of_birth"));
        assert!(!fields[0].reqd);
    }

    #[test]
    fn test_after_install_twice_is_a_no_op() {
        let mut registry = Registry::default();
        after_install(&mut registry).unwrap();
        assert!(!after_install(&mut registry).unwrap());
        assert_eq!(registry.fields["Employee"].len(), 1);
    }

    #[test]
    fn test_link_filter_accepts_only_submitted() {
        let query = state_link_filters();
        let mut state = Jurisdiction {
            name: "Maharashtra".to_string(),
            docstatus: DocStatus::Submitted,
            formula: vec![],
        };
        assert!(query.matches(&state));

        state.docstatus = DocStatus::Draft;
        assert!(!query.matches(&state));
        state.docstatus = DocStatus::Cancelled;
        assert!(!query.matches(&state));
    }
}
