//! Schema catalog for the committee-meeting store.
//!
//! Declares, for every [`QueryKind`], the backing table, its ordered columns
//! and its keys. The catalog is immutable once built and is the only source of
//! identifiers that ever reach generated SQL.
//!
//! Two constructors:
//! - [`SchemaCatalog::committee`]: the canonical meeting/summary/subject schema.
//! - [`SchemaCatalog::from_ddl`]: the same shape discovered from `CREATE TABLE`
//!   statements (tables are bound to kinds by their canonical names).

use anyhow::{anyhow, Result};
use sqlparser::ast::{ColumnOption, Statement, TableConstraint};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::node::QueryKind;

/// DDL of the committee-meeting store.
pub const COMMITTEE_DDL: &str = "\
CREATE TABLE meetings (
    number INTEGER NOT NULL,
    meeting_date DATE NOT NULL,
    start_time TIME NOT NULL,
    end_time TIME NOT NULL,
    time_zone CHAR(3) NOT NULL,
    PRIMARY KEY (number)
);
CREATE TABLE meeting_summaries (
    id INTEGER PRIMARY KEY,
    vector_id BIGINT,
    summary TEXT NOT NULL,
    meeting_number INTEGER NOT NULL,
    speaker VARCHAR(50),
    CONSTRAINT summaries_meetings_fk FOREIGN KEY (meeting_number) REFERENCES meetings (number) ON DELETE CASCADE
);
CREATE TABLE meeting_subjects (
    name VARCHAR(100) NOT NULL,
    meeting_number INTEGER NOT NULL,
    PRIMARY KEY (name, meeting_number),
    CONSTRAINT subjects_meeting_fk FOREIGN KEY (meeting_number) REFERENCES meetings (number) ON DELETE CASCADE
);
";

const MEETING_DATE_COLUMN: &str = "meeting_date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCatalog {
    /// Indexed by `QueryKind::index`.
    tables: [TableDef; 3],
    foreign_keys: Vec<ForeignKey>,
    ddl: String,
}

impl SchemaCatalog {
    /// The canonical committee-meeting schema.
    pub fn committee() -> Self {
        fn col(name: &str, data_type: &str, nullable: bool) -> ColumnDef {
            ColumnDef {
                name: name.to_string(),
                data_type: data_type.to_string(),
                nullable,
            }
        }
        fn fk(from_table: &str) -> ForeignKey {
            ForeignKey {
                from_table: from_table.to_string(),
                from_columns: vec!["meeting_number".to_string()],
                to_table: "meetings".to_string(),
                to_columns: vec!["number".to_string()],
            }
        }

        let meetings = TableDef {
            name: "meetings".to_string(),
            columns: vec![
                col("number", "INTEGER", false),
                col("meeting_date", "DATE", false),
                col("start_time", "TIME", false),
                col("end_time", "TIME", false),
                col("time_zone", "CHAR(3)", false),
            ],
            primary_key: vec!["number".to_string()],
        };
        let summaries = TableDef {
            name: "meeting_summaries".to_string(),
            columns: vec![
                col("id", "INTEGER", true),
                col("vector_id", "BIGINT", true),
                col("summary", "TEXT", false),
                col("meeting_number", "INTEGER", false),
                col("speaker", "VARCHAR(50)", true),
            ],
            primary_key: vec!["id".to_string()],
        };
        let subjects = TableDef {
            name: "meeting_subjects".to_string(),
            columns: vec![
                col("name", "VARCHAR(100)", false),
                col("meeting_number", "INTEGER", false),
            ],
            primary_key: vec!["name".to_string(), "meeting_number".to_string()],
        };

        Self {
            tables: [meetings, summaries, subjects],
            foreign_keys: vec![fk("meeting_summaries"), fk("meeting_subjects")],
            ddl: COMMITTEE_DDL.to_string(),
        }
    }

    /// Build a catalog from `CREATE TABLE` statements.
    ///
    /// The DDL must define `meetings`, `meeting_summaries` and
    /// `meeting_subjects`; other tables are ignored.
    pub fn from_ddl(sql: &str) -> Result<Self> {
        let dialect = GenericDialect {};
        let statements = Parser::parse_sql(&dialect, sql)?;

        let mut tables: Vec<TableDef> = Vec::new();
        let mut foreign_keys: Vec<ForeignKey> = Vec::new();

        for stmt in statements {
            let Statement::CreateTable {
                name,
                columns: sql_columns,
                constraints: sql_constraints,
                ..
            } = stmt
            else {
                continue;
            };

            let table_name = name
                .0
                .last()
                .map(|ident| ident.value.clone())
                .unwrap_or_default();
            let mut columns = Vec::new();
            let mut primary_key = Vec::new();

            for col in &sql_columns {
                let mut nullable = true;
                for opt in &col.options {
                    match &opt.option {
                        ColumnOption::NotNull => nullable = false,
                        ColumnOption::Unique { is_primary, .. } if *is_primary => {
                            primary_key.push(col.name.value.clone());
                        }
                        ColumnOption::ForeignKey {
                            foreign_table,
                            referred_columns,
                            ..
                        } => foreign_keys.push(ForeignKey {
                            from_table: table_name.clone(),
                            from_columns: vec![col.name.value.clone()],
                            to_table: foreign_table.to_string(),
                            to_columns: referred_columns.iter().map(|c| c.value.clone()).collect(),
                        }),
                        _ => {}
                    }
                }
                columns.push(ColumnDef {
                    name: col.name.value.clone(),
                    data_type: col.data_type.to_string(),
                    nullable,
                });
            }

            for constraint in &sql_constraints {
                match constraint {
                    TableConstraint::ForeignKey {
                        columns: fk_cols,
                        foreign_table,
                        referred_columns,
                        ..
                    } => foreign_keys.push(ForeignKey {
                        from_table: table_name.clone(),
                        from_columns: fk_cols.iter().map(|c| c.value.clone()).collect(),
                        to_table: foreign_table.to_string(),
                        to_columns: referred_columns.iter().map(|c| c.value.clone()).collect(),
                    }),
                    TableConstraint::Unique {
                        columns: uq_cols,
                        is_primary,
                        ..
                    } if *is_primary => {
                        primary_key = uq_cols.iter().map(|c| c.value.clone()).collect();
                    }
                    _ => {}
                }
            }

            tables.push(TableDef {
                name: table_name,
                columns,
                primary_key,
            });
        }

        let mut take = |kind: QueryKind| -> Result<TableDef> {
            let wanted = canonical_table(kind);
            let pos = tables
                .iter()
                .position(|t| t.name.eq_ignore_ascii_case(wanted))
                .ok_or_else(|| anyhow!("DDL does not define table `{wanted}` for {kind}"))?;
            Ok(tables.swap_remove(pos))
        };
        let meetings = take(QueryKind::Meeting)?;
        let summaries = take(QueryKind::Summary)?;
        let subjects = take(QueryKind::Subject)?;

        let bound = [&meetings.name, &summaries.name, &subjects.name];
        foreign_keys.retain(|fk| bound.iter().any(|t| t.eq_ignore_ascii_case(&fk.from_table)));

        Ok(Self {
            tables: [meetings, summaries, subjects],
            foreign_keys,
            ddl: sql.to_string(),
        })
    }

    pub fn table(&self, kind: QueryKind) -> &TableDef {
        &self.tables[kind.index()]
    }

    pub fn table_for(&self, kind: QueryKind) -> &str {
        &self.table(kind).name
    }

    pub fn is_valid_column(&self, kind: QueryKind, name: &str) -> bool {
        self.table(kind).column(name).is_some()
    }

    /// Column names of `kind` in declaration order (the order of `SELECT *`).
    pub fn columns(&self, kind: QueryKind) -> impl Iterator<Item = &str> {
        self.table(kind).columns.iter().map(|c| c.name.as_str())
    }

    /// The column a node's date range applies to, if the kind has one.
    pub fn date_column(&self, kind: QueryKind) -> Option<&str> {
        match kind {
            QueryKind::Meeting => self
                .table(kind)
                .column(MEETING_DATE_COLUMN)
                .map(|c| c.name.as_str()),
            QueryKind::Summary | QueryKind::Subject => None,
        }
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn ddl(&self) -> &str {
        &self.ddl
    }

    /// Deterministic text description handed to the planner.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for kind in QueryKind::ALL {
            let table = self.table(kind);
            let columns = table
                .columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("{kind}: table {}({columns})", table.name));
            if !table.primary_key.is_empty() {
                out.push_str(&format!("; primary key ({})", table.primary_key.join(", ")));
            }
            for fk in self
                .foreign_keys
                .iter()
                .filter(|fk| fk.from_table.eq_ignore_ascii_case(&table.name))
            {
                out.push_str(&format!(
                    "; ({}) references {}({})",
                    fk.from_columns.join(", "),
                    fk.to_table,
                    fk.to_columns.join(", ")
                ));
            }
            out.push('\n');
        }
        out
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::committee()
    }
}

fn canonical_table(kind: QueryKind) -> &'static str {
    match kind {
        QueryKind::Meeting => "meetings",
        QueryKind::Summary => "meeting_summaries",
        QueryKind::Subject => "meeting_subjects",
    }
}
