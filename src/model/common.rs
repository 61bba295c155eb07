/// Row identifier type shared by every entity. Ids are BIGSERIAL values
/// assigned by PostgreSQL, never generated in process.
pub type Id = i64;
