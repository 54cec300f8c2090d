//! Catalog rows and the capability to read them.

use firebird_types::{map_type, FieldDescriptor, SYSTEM_PREFIX};

use crate::error::Result;

/// A field definition as read from `RDB$FIELDS`, either standalone (a
/// domain) or joined through `RDB$RELATION_FIELDS` (a column).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRow {
    pub name: String,
    pub field_type: Option<i32>,
    pub sub_type: Option<i32>,
    pub length: Option<i32>,
    pub char_length: Option<i32>,
    pub scale: Option<i32>,
    /// `RDB$DEFAULT_SOURCE`, including the leading `DEFAULT` keyword.
    pub default_source: Option<String>,
    /// `RDB$NULL_FLAG`
    pub null_flag: Option<i32>,
}

impl FieldRow {
    /// Row with the type columns taken from `descriptor`.
    pub fn new(name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        Self {
            name: name.into(),
            field_type: Some(descriptor.field_type),
            sub_type: Some(descriptor.sub_type),
            length: Some(descriptor.length),
            char_length: Some(descriptor.char_length),
            scale: Some(descriptor.scale),
            default_source: None,
            null_flag: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.null_flag = Some(1);
        self
    }

    pub fn with_default(mut self, default_source: impl Into<String>) -> Self {
        self.default_source = Some(default_source.into());
        self
    }

    /// Type columns with NULLs read as 0.
    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor {
            field_type: self.field_type.unwrap_or(0),
            sub_type: self.sub_type.unwrap_or(0),
            length: self.length.unwrap_or(0),
            char_length: self.char_length.unwrap_or(0),
            scale: self.scale.unwrap_or(0),
        }
    }

    /// Canonical type name of this field.
    pub fn data_type(&self) -> String {
        map_type(&self.descriptor())
    }

    /// True when the catalog null flag is set at all.
    ///
    /// A present flag of 0 still counts as NOT NULL.
    pub fn is_not_null(&self) -> bool {
        self.null_flag.is_some()
    }
}

/// A row of `RDB$PROCEDURES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureRow {
    pub name: String,
    /// Body text; NULL when the procedure was stored without source.
    pub source: Option<String>,
}

/// Which side of a procedure signature a parameter belongs to
/// (`RDB$PARAMETER_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    Input = 0,
    Output = 1,
}

impl ParameterDirection {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A row of `RDB$PROCEDURE_PARAMETERS` joined to its field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub name: String,
    /// `RDB$FIELD_SOURCE`: a user domain or a system-generated `RDB$n` field.
    pub field_source: String,
    pub field: FieldDescriptor,
}

impl ParameterRow {
    pub fn new(
        name: impl Into<String>,
        field_source: impl Into<String>,
        field: FieldDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            field_source: field_source.into(),
            field,
        }
    }

    /// Type as written in a parameter list.
    ///
    /// Parameters declared with a built-in type get a generated `RDB$` field
    /// and are typed from it; parameters declared with a domain keep the
    /// domain name.
    pub fn data_type(&self) -> String {
        if self.field_source.starts_with(SYSTEM_PREFIX) {
            map_type(&self.field)
        } else {
            self.field_source.clone()
        }
    }
}

/// Read access to the system catalog.
///
/// Implementations return rows in catalog order: objects by name, columns by
/// field position and parameters by parameter number. Only user objects
/// (`RDB$SYSTEM_FLAG = 0`) are returned; relations exclude views.
pub trait CatalogSource {
    /// All user field definitions, including generated `RDB$` fields.
    fn fields(&mut self) -> Result<Vec<FieldRow>>;

    /// Names of user tables.
    fn relations(&mut self) -> Result<Vec<String>>;

    /// Columns of `relation`, empty when it does not exist.
    fn relation_fields(&mut self, relation: &str) -> Result<Vec<FieldRow>>;

    fn procedures(&mut self) -> Result<Vec<ProcedureRow>>;

    fn procedure_parameters(
        &mut self,
        procedure: &str,
        direction: ParameterDirection,
    ) -> Result<Vec<ParameterRow>>;
}
