//! Database schema definitions

/// SQL to create the sources table.
///
/// `filename` uniqueness lives here rather than in application code so that
/// concurrent writers on separate connections cannot both insert the same name.
pub const CREATE_SOURCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE CHECK (length(filename) > 0),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sources_updated_at ON sources(updated_at)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_SOURCES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
