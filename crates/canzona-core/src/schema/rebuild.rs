//! Rebuild-and-copy for table changes SQLite cannot express with `ALTER TABLE`.
//!
//! Dropping or reordering columns, changing a primary key, and merging
//! duplicate rows all go through the same sequence:
//!
//! 1. create `<Table>_Shadow` with the target shape
//! 2. fill it from the original table (optionally computing a canonical id
//!    per row for deduplication)
//! 3. re-point dependent foreign keys at the canonical ids
//! 4. drop the original table
//! 5. create the final table and its indexes
//! 6. copy the (canonical) rows across
//! 7. drop the shadow
//!
//! The caller runs this inside the step's transaction. Compaction happens
//! after commit, in the migrator.

use rusqlite::Connection;

const SHADOW_SUFFIX: &str = "_Shadow";
const CANONICAL_COLUMN: &str = "CanonicalID";

/// A column name with its SQL declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub decl: &'static str,
}

pub const fn column(name: &'static str, decl: &'static str) -> Column {
    Column { name, decl }
}

/// The shape of a table: ordered columns and an optional table-level primary key.
#[derive(Debug)]
pub struct TableShape {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub primary_key: Option<&'static str>,
}

impl TableShape {
    /// `CREATE TABLE` for this shape under `table`, with `extra` columns appended.
    pub fn create_sql(&self, table: &str, extra: &[Column]) -> String {
        let mut defs: Vec<String> = self
            .columns
            .iter()
            .chain(extra)
            .map(|c| format!("{} {}", c.name, c.decl))
            .collect();
        if let Some(pk) = self.primary_key {
            defs.push(format!("PRIMARY KEY({pk})"));
        }
        format!("CREATE TABLE {table} ({})", defs.join(", "))
    }

    pub fn column_names(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single-table index.
#[derive(Debug, Clone, Copy)]
pub struct Index {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static str,
}

impl Index {
    pub fn create_sql(&self) -> String {
        format!("CREATE INDEX {} ON {}({})", self.name, self.table, self.columns)
    }
}

/// A column in another table that references the rebuilt table's identity.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

/// Merge rows that are equal on their trimmed, case-folded natural key.
///
/// The surviving row is the one with the lowest identity value.
#[derive(Debug)]
pub struct Dedup {
    pub identity: &'static str,
    pub natural_key: &'static [&'static str],
    pub dependents: &'static [ForeignKey],
}

impl Dedup {
    /// Window expression yielding the canonical id for the row aliased `src`.
    ///
    /// Partitioning groups NULL keys together, so rows with a NULL natural
    /// key column still merge.
    fn canonical_expr(&self) -> String {
        let keys: Vec<String> = self
            .natural_key
            .iter()
            .map(|k| format!("LOWER(TRIM(src.{k}))"))
            .collect();
        format!(
            "MIN(src.{id}) OVER (PARTITION BY {keys})",
            id = self.identity,
            keys = keys.join(", "),
        )
    }
}

/// One rebuild of a table into a new shape.
#[derive(Debug)]
pub struct Rebuild<'a> {
    pub shape: &'a TableShape,
    /// Select-list over the original table, one expression per target
    /// column. `None` copies same-named columns.
    pub source: Option<&'a [&'a str]>,
    pub dedup: Option<&'a Dedup>,
    pub indexes: &'a [Index],
}

impl<'a> Rebuild<'a> {
    pub const fn new(shape: &'a TableShape) -> Self {
        Self {
            shape,
            source: None,
            dedup: None,
            indexes: &[],
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: &'a [&'a str]) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_dedup(mut self, dedup: &'a Dedup) -> Self {
        self.dedup = Some(dedup);
        self
    }

    #[must_use]
    pub fn with_indexes(mut self, indexes: &'a [Index]) -> Self {
        self.indexes = indexes;
        self
    }

    fn shadow_name(&self) -> String {
        format!("{}{SHADOW_SUFFIX}", self.shape.name)
    }

    /// The ordered statements this rebuild executes.
    pub fn plan(&self) -> Vec<String> {
        let table = self.shape.name;
        let shadow = self.shadow_name();
        let names = self.shape.column_names();

        let select = match self.source {
            Some(exprs) => {
                debug_assert_eq!(exprs.len(), self.shape.columns.len());
                exprs.join(", ")
            }
            None => names.clone(),
        };

        let mut plan = Vec::new();

        match self.dedup {
            Some(dedup) => {
                plan.push(
                    self.shape
                        .create_sql(&shadow, &[column(CANONICAL_COLUMN, "INTEGER")]),
                );
                plan.push(format!(
                    "INSERT INTO {shadow} ({names}, {CANONICAL_COLUMN}) \
                     SELECT {select}, {canonical} FROM {table} AS src",
                    canonical = dedup.canonical_expr(),
                ));
                for fk in dedup.dependents {
                    plan.push(format!(
                        "UPDATE {dep} SET {col} = (SELECT {CANONICAL_COLUMN} FROM {shadow} \
                         WHERE {shadow}.{id} = {dep}.{col})",
                        dep = fk.table,
                        col = fk.column,
                        id = dedup.identity,
                    ));
                }
            }
            None => {
                plan.push(self.shape.create_sql(&shadow, &[]));
                plan.push(format!(
                    "INSERT INTO {shadow} ({names}) SELECT {select} FROM {table} AS src"
                ));
            }
        }

        plan.push(format!("DROP TABLE {table}"));
        plan.push(self.shape.create_sql(table, &[]));
        plan.extend(self.indexes.iter().map(Index::create_sql));

        let filter = self
            .dedup
            .map(|d| format!(" WHERE {} = {CANONICAL_COLUMN}", d.identity))
            .unwrap_or_default();
        plan.push(format!(
            "INSERT INTO {table} ({names}) SELECT {names} FROM {shadow}{filter}"
        ));
        plan.push(format!("DROP TABLE {shadow}"));

        plan
    }

    /// Execute the rebuild on `conn`.
    pub fn run(&self, conn: &Connection) -> rusqlite::Result<()> {
        log::debug!("Rebuilding table {}", self.shape.name);
        for statement in self.plan() {
            conn.execute_batch(&statement)?;
        }
        Ok(())
    }
}
