use tokio_postgres::types::{Kind, Type};

/// SQL type of columns inferred as booleans.
pub const BOOL_TYPE_NAME: &str = "boolean";
/// SQL type of columns inferred as integers.
pub const INT8_TYPE_NAME: &str = "bigint";
/// SQL type of columns inferred as floating point numbers.
pub const FLOAT8_TYPE_NAME: &str = "double precision";
/// SQL type of text columns and of any column whose type only exists in the source database.
pub const TEXT_TYPE_NAME: &str = "text";

/// Converts a Postgres type oid to a [`Type`].
///
/// Types unknown to the driver (enums, domains, composites, extension types) become an unnamed
/// placeholder carrying the oid.
pub fn convert_type_oid_to_type(type_oid: u32) -> Type {
    Type::from_oid(type_oid).unwrap_or(Type::new(
        format!("unnamed_type({type_oid})"),
        type_oid,
        Kind::Simple,
        "pg_catalog".to_string(),
    ))
}

/// Returns `true` if `typ` is a builtin type, which therefore exists in every database.
pub fn is_builtin_type(typ: &Type) -> bool {
    Type::from_oid(typ.oid()).is_some()
}
