//! Firebird catalog type codes to canonical type names.
//!
//! `RDB$FIELDS.RDB$FIELD_TYPE` holds a numeric type code; together with the
//! scale and character length it determines the textual type written into
//! snapshots and DDL.

/// `RDB$FIELD_TYPE` codes understood by the mapper.
pub mod codes {
    pub const SMALLINT: i32 = 7;
    pub const INTEGER: i32 = 8;
    pub const FLOAT: i32 = 10;
    pub const DATE: i32 = 12;
    pub const TIME: i32 = 13;
    pub const CHAR: i32 = 14;
    pub const BIGINT: i32 = 16;
    pub const DOUBLE: i32 = 27;
    pub const VARCHAR: i32 = 37;
    pub const BLOB: i32 = 261;
}

/// Catalog field descriptor.
///
/// Catalog NULLs are coerced to 0 before a descriptor is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// `RDB$FIELD_TYPE`
    pub field_type: i32,
    /// `RDB$FIELD_SUB_TYPE`
    pub sub_type: i32,
    /// `RDB$FIELD_LENGTH` (bytes)
    pub length: i32,
    /// `RDB$CHARACTER_LENGTH` (characters)
    pub char_length: i32,
    /// `RDB$FIELD_SCALE`
    pub scale: i32,
}

impl FieldDescriptor {
    /// Descriptor with only a type code set.
    pub fn of_type(field_type: i32) -> Self {
        Self {
            field_type,
            ..Self::default()
        }
    }

    /// Canonical type name of this descriptor.
    pub fn canonical_type(&self) -> String {
        map_type(self)
    }
}

/// Map a catalog field descriptor to its canonical type name.
///
/// Total over all inputs: unrecognized type codes map to `BLOB`. Sub-type and
/// byte length do not influence the result.
pub fn map_type(field: &FieldDescriptor) -> String {
    match field.field_type {
        codes::SMALLINT => {
            if field.scale < 0 {
                "DECIMAL".to_string()
            } else {
                "SMALLINT".to_string()
            }
        }
        codes::INTEGER => {
            if field.scale < 0 {
                "NUMERIC".to_string()
            } else {
                "INTEGER".to_string()
            }
        }
        codes::FLOAT => "FLOAT".to_string(),
        codes::DATE => "DATE".to_string(),
        codes::TIME => "TIME".to_string(),
        codes::CHAR => format!("CHAR({})", field.char_length),
        // Scaled BIGINT is not told apart from the plain one.
        codes::BIGINT => "BIGINT".to_string(),
        codes::VARCHAR => format!("VARCHAR({})", field.char_length),
        codes::DOUBLE => "DOUBLE PRECISION".to_string(),
        _ => "BLOB".to_string(),
    }
}

/// Approximate inverse of [`map_type`].
///
/// Produces a descriptor that maps back to the same canonical name. Scaled
/// types get a scale of -2. Anything unrecognized becomes a BLOB descriptor.
pub fn parse_canonical_type(type_name: &str) -> FieldDescriptor {
    let normalized = type_name.trim().to_uppercase();

    if let Some(length) = sized(&normalized, "CHAR") {
        return FieldDescriptor {
            field_type: codes::CHAR,
            length,
            char_length: length,
            ..FieldDescriptor::default()
        };
    }
    if let Some(length) = sized(&normalized, "VARCHAR") {
        return FieldDescriptor {
            field_type: codes::VARCHAR,
            length,
            char_length: length,
            ..FieldDescriptor::default()
        };
    }

    let scaled = |field_type| FieldDescriptor {
        field_type,
        scale: -2,
        ..FieldDescriptor::default()
    };

    match normalized.as_str() {
        "SMALLINT" => FieldDescriptor::of_type(codes::SMALLINT),
        "DECIMAL" => scaled(codes::SMALLINT),
        "INTEGER" => FieldDescriptor::of_type(codes::INTEGER),
        "NUMERIC" => scaled(codes::INTEGER),
        "FLOAT" => FieldDescriptor::of_type(codes::FLOAT),
        "DATE" => FieldDescriptor::of_type(codes::DATE),
        "TIME" => FieldDescriptor::of_type(codes::TIME),
        "BIGINT" => FieldDescriptor::of_type(codes::BIGINT),
        "DOUBLE PRECISION" => FieldDescriptor::of_type(codes::DOUBLE),
        _ => FieldDescriptor::of_type(codes::BLOB),
    }
}

/// Parse `NAME(<n>)` into `n`.
fn sized(type_name: &str, name: &str) -> Option<i32> {
    type_name
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(field_type: i32, scale: i32) -> String {
        map_type(&FieldDescriptor {
            field_type,
            scale,
            ..FieldDescriptor::default()
        })
    }

    #[test]
    fn test_scaled_integer_types() {
        assert_eq!(mapped(7, -2), "DECIMAL");
        assert_eq!(mapped(7, 0), "SMALLINT");
        assert_eq!(mapped(8, -4), "NUMERIC");
        assert_eq!(mapped(8, 0), "INTEGER");
    }

    #[test]
    fn test_bigint_ignores_scale() {
        assert_eq!(mapped(16, -2), "BIGINT");
        assert_eq!(mapped(16, 0), "BIGINT");
    }

    #[test]
    fn test_fixed_types() {
        assert_eq!(mapped(10, 0), "FLOAT");
        assert_eq!(mapped(12, 0), "DATE");
        assert_eq!(mapped(13, 0), "TIME");
        assert_eq!(mapped(27, 0), "DOUBLE PRECISION");
    }

    #[test]
    fn test_character_types_use_char_length() {
        let field = FieldDescriptor {
            field_type: 37,
            length: 200,
            char_length: 50,
            ..FieldDescriptor::default()
        };
        assert_eq!(map_type(&field), "VARCHAR(50)");

        let field = FieldDescriptor {
            field_type: 14,
            length: 12,
            char_length: 3,
            ..FieldDescriptor::default()
        };
        assert_eq!(map_type(&field), "CHAR(3)");
    }

    #[test]
    fn test_unknown_codes_fall_back_to_blob() {
        for code in [0, 1, 9, 23, 35, 261, -1, i32::MAX, i32::MIN] {
            assert_eq!(mapped(code, 0), "BLOB", "type code {code}");
        }
    }

    #[test]
    fn test_sub_type_does_not_matter() {
        let field = FieldDescriptor {
            field_type: 8,
            sub_type: 2,
            ..FieldDescriptor::default()
        };
        assert_eq!(map_type(&field), "INTEGER");
    }

    #[test]
    fn test_parse_canonical_type_maps_back() {
        for name in [
            "SMALLINT",
            "DECIMAL",
            "INTEGER",
            "NUMERIC",
            "FLOAT",
            "DATE",
            "TIME",
            "CHAR(3)",
            "BIGINT",
            "VARCHAR(50)",
            "DOUBLE PRECISION",
            "BLOB",
        ] {
            assert_eq!(parse_canonical_type(name).canonical_type(), name);
        }
    }

    #[test]
    fn test_parse_canonical_type_is_lenient() {
        assert_eq!(parse_canonical_type(" varchar( 10 ) ").canonical_type(), "VARCHAR(10)");
        assert_eq!(parse_canonical_type("TIMESTAMP").field_type, codes::BLOB);
        assert_eq!(parse_canonical_type("CHAR(x)").field_type, codes::BLOB);
    }
}
