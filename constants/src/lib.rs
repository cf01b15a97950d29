/// Shared defaults for slice preprocessing and the case tracking schema
pub mod case_schema;
pub mod processing;
