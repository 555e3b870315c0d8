//! Structural snapshots of a database schema.
//!
//! A snapshot records tables, their columns (declared type, primary-key and
//! not-null flags) and their indexes. Column order is not recorded:
//! `ALTER TABLE ... ADD` always appends, so a migrated table and a freshly
//! created one can hold the same columns in a different order.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub decl_type: String,
    pub primary_key: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub columns: BTreeMap<String, ColumnInfo>,
    /// Index name to indexed columns, in index order.
    pub indexes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeMap<String, TableInfo>,
}

impl SchemaSnapshot {
    /// Capture the user tables of `conn`. SQLite's internal tables and
    /// automatic indexes are skipped.
    pub fn capture(conn: &Connection) -> rusqlite::Result<Self> {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tables = BTreeMap::new();
        for name in names {
            let info = TableInfo {
                columns: columns(conn, &name)?,
                indexes: indexes(conn, &name)?,
            };
            tables.insert(name, info);
        }

        Ok(Self { tables })
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(name)
    }

    /// Human-readable differences between `self` and `other`. Empty when the
    /// two are structurally equal.
    pub fn differences(&self, other: &Self) -> Vec<String> {
        let mut out = Vec::new();

        for (name, table) in &self.tables {
            let Some(theirs) = other.tables.get(name) else {
                out.push(format!("table {name} only on the left"));
                continue;
            };
            for (col, info) in &table.columns {
                match theirs.columns.get(col) {
                    None => out.push(format!("column {name}.{col} only on the left")),
                    Some(other_info) if other_info != info => out.push(format!(
                        "column {name}.{col} differs: {info:?} vs {other_info:?}"
                    )),
                    Some(_) => {}
                }
            }
            for col in theirs.columns.keys() {
                if !table.columns.contains_key(col) {
                    out.push(format!("column {name}.{col} only on the right"));
                }
            }
            for (index, cols) in &table.indexes {
                match theirs.indexes.get(index) {
                    None => out.push(format!("index {index} on {name} only on the left")),
                    Some(other_cols) if other_cols != cols => out.push(format!(
                        "index {index} differs: {cols:?} vs {other_cols:?}"
                    )),
                    Some(_) => {}
                }
            }
            for index in theirs.indexes.keys() {
                if !table.indexes.contains_key(index) {
                    out.push(format!("index {index} on {name} only on the right"));
                }
            }
        }

        for name in other.tables.keys() {
            if !self.tables.contains_key(name) {
                out.push(format!("table {name} only on the right"));
            }
        }

        out
    }
}

fn columns(conn: &Connection, table: &str) -> rusqlite::Result<BTreeMap<String, ColumnInfo>> {
    let mut stmt =
        conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)")?;
    let rows = stmt
        .query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ColumnInfo {
                    decl_type: row.get::<_, String>(1)?.to_uppercase(),
                    not_null: row.get::<_, i64>(2)? != 0,
                    primary_key: row.get::<_, i64>(3)? != 0,
                },
            ))
        })?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
    Ok(rows)
}

fn indexes(conn: &Connection, table: &str) -> rusqlite::Result<BTreeMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'index' AND tbl_name = ?1 AND name NOT LIKE 'sqlite\\_autoindex%' ESCAPE '\\'",
    )?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut info_stmt = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let mut out = BTreeMap::new();
    for name in names {
        let cols = info_stmt
            .query_map([&name], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        out.insert(name, cols);
    }
    Ok(out)
}
