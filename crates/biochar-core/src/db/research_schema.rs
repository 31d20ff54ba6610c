use rusqlite::{Connection, Result};

pub const DB_VERSION: i32 = 1; // latest schema version

pub const RESEARCH_TABLE: &str = "biochar_research";

/// Column name and SQL type for every field of a research record, in insert order.
pub const RESEARCH_COLUMNS: &[(&str, &str)] = &[
    ("researcher_name", "TEXT NOT NULL"),
    ("academic_level", "TEXT"),
    ("advisor_name", "TEXT"),
    ("research_title", "TEXT"),
    ("institution", "TEXT"),
    ("city", "TEXT"),
    ("state", "TEXT"),
    ("sample_id", "TEXT NOT NULL"),
    ("biomass_type", "TEXT"),
    ("pyrolysis_temp", "REAL"),
    ("carbon_content", "REAL"),
    ("hc_ratio", "REAL"),
    ("biochar_mass_ton", "REAL"),
    ("collected_at", "TEXT NOT NULL"),
    ("app_version", "TEXT"),
];

pub fn create_research_table() -> String {
    let columns: Vec<String> =
        RESEARCH_COLUMNS.iter().map(|(name, ty)| format!("{name} {ty}")).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {RESEARCH_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            {}
        )",
        columns.join(",\n            ")
    )
}

/// Creates the research table and its index when missing. The schema version is
/// stamped only on a table created here; older stores go through
/// [`crate::db::migrate::migrate_db`].
pub fn initiate_tables(conn: &Connection) -> Result<()> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [RESEARCH_TABLE],
        |row| row.get(0),
    )?;
    conn.execute(&create_research_table(), [])?;
    conn.execute(
        &format!(
            "CREATE INDEX IF NOT EXISTS idx_research_collected_at
             ON {RESEARCH_TABLE} (collected_at)"
        ),
        [],
    )?;
    if !existed {
        conn.execute(&format!("PRAGMA user_version = {};", DB_VERSION), [])?;
    }
    Ok(())
}
