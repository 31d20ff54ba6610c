use crate::db::research_schema::{DB_VERSION, RESEARCH_COLUMNS, RESEARCH_TABLE};
use rusqlite::{Connection, OptionalExtension, Result};

/// Brings an existing database up to the current schema.
/// Returns the number of columns that had to be added.
pub fn migrate_db(conn: &Connection) -> Result<usize> {
    // user_version is 0 by default in SQLite
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if version >= DB_VERSION {
        return Ok(0);
    }

    conn.execute(&crate::db::research_schema::create_research_table(), [])?;

    // stores written before a field existed get the column added as nullable
    let mut added = 0;
    for (name, ty) in RESEARCH_COLUMNS {
        if !column_exists(conn, RESEARCH_TABLE, name)? {
            let nullable_ty = ty.replace(" NOT NULL", "");
            println!("Applying migration v{}: add {}.{}", DB_VERSION, RESEARCH_TABLE, name);
            conn.execute(
                &format!("ALTER TABLE {RESEARCH_TABLE} ADD COLUMN {name} {nullable_ty};"),
                [],
            )?;
            added += 1;
        }
    }

    println!("Setting PRAGMA user_version = {}", DB_VERSION);
    conn.execute(&format!("PRAGMA user_version = {};", DB_VERSION), [])?;

    Ok(added)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    // NOTE: the table name has to be a literal in the pragma call.
    fn esc(s: &str) -> String {
        s.replace('\'', "''")
    }

    let sql = format!("SELECT 1 FROM pragma_table_info('{}') WHERE name = ?1 LIMIT 1;", esc(table));
    conn.query_row(&sql, [column], |_| Ok(true)).optional().map(|opt| opt.unwrap_or(false))
}
