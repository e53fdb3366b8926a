// schema.rs
use tracing::{debug, warn};

use crate::libs::database::Database;
use crate::libs::error::{RelayError, RelayResult};

/// SQL flavour a descriptor is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer key.
    Serial,
    VarChar(u16),
    DateTime,
}

impl ColumnType {
    fn render(self, dialect: Dialect) -> String {
        match (self, dialect) {
            (ColumnType::Serial, Dialect::MySql) => "INT(11) NOT NULL AUTO_INCREMENT".to_string(),
            (ColumnType::Serial, Dialect::Sqlite) => "INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            (ColumnType::VarChar(len), _) => format!("VARCHAR({})", len),
            (ColumnType::DateTime, _) => "DATETIME".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub sql_type: ColumnType,
    pub primary: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSchema],
}

/// The only table the relay knows about.
pub const PATIENT_TABLE: TableSchema = TableSchema {
    name: "patient",
    columns: &[
        ColumnSchema {
            name: "patientid",
            sql_type: ColumnType::Serial,
            primary: true,
            not_null: true,
        },
        ColumnSchema {
            name: "name",
            sql_type: ColumnType::VarChar(100),
            primary: false,
            not_null: true,
        },
        ColumnSchema {
            name: "dateOfBirth",
            sql_type: ColumnType::DateTime,
            primary: false,
            not_null: false,
        },
    ],
};

impl TableSchema {
    fn primary_key(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name)
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` for this table. The existence check is
    /// folded into the statement so concurrent callers cannot race.
    pub fn create_if_missing_sql(&self, dialect: Dialect) -> String {
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.name);
        let mut defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut col_def = format!("{} {}", c.name, c.sql_type.render(dialect));
                // Serial already spells out its own constraints.
                if c.not_null && c.sql_type != ColumnType::Serial {
                    col_def.push_str(" NOT NULL");
                }
                col_def
            })
            .collect();

        // SQLite declares the key inline with AUTOINCREMENT.
        if dialect == Dialect::MySql {
            let keys = self.primary_key();
            if !keys.is_empty() {
                defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
            }
        }

        sql.push_str(&defs.join(", "));
        sql.push(')');
        if dialect == Dialect::MySql {
            sql.push_str(" ENGINE=InnoDB");
        }
        sql
    }
}

/// Make sure `table` exists before anything is run against it.
pub async fn ensure_table(db: &dyn Database, table: &TableSchema) -> RelayResult<()> {
    let sql = table.create_if_missing_sql(db.dialect());
    debug!(table = table.name, "ensuring table exists");
    db.execute(&sql).await.map(|_| ()).map_err(|e| {
        warn!(table = table.name, error = %e, "create table failed");
        RelayError::CreateTableError(e.to_string())
    })
}
