use anyhow::Result;
use quorum_plan::{QueryKind, SchemaCatalog, COMMITTEE_DDL};

#[test]
fn committee_ddl_matches_builtin_catalog() -> Result<()> {
    let parsed = SchemaCatalog::from_ddl(COMMITTEE_DDL)?;
    let builtin = SchemaCatalog::committee();

    for kind in QueryKind::ALL {
        assert_eq!(parsed.table_for(kind), builtin.table_for(kind));
        assert_eq!(
            parsed.columns(kind).collect::<Vec<_>>(),
            builtin.columns(kind).collect::<Vec<_>>(),
            "column order for {kind}"
        );
        assert_eq!(parsed.table(kind).primary_key, builtin.table(kind).primary_key);
    }
    assert_eq!(parsed.foreign_keys(), builtin.foreign_keys());
    Ok(())
}

#[test]
fn ddl_nullability_follows_not_null() -> Result<()> {
    let catalog = SchemaCatalog::from_ddl(COMMITTEE_DDL)?;
    let summaries = catalog.table(QueryKind::Summary);
    assert_eq!(summaries.column("speaker").map(|c| c.nullable), Some(true));
    assert_eq!(summaries.column("summary").map(|c| c.nullable), Some(false));
    Ok(())
}

#[test]
fn ddl_with_extra_columns_extends_validation() -> Result<()> {
    let ddl = "
        CREATE TABLE meetings (number INTEGER NOT NULL, meeting_date DATE NOT NULL, room VARCHAR(20), PRIMARY KEY (number));
        CREATE TABLE meeting_summaries (id INTEGER PRIMARY KEY, summary TEXT, meeting_number INTEGER REFERENCES meetings (number));
        CREATE TABLE meeting_subjects (name VARCHAR(100), meeting_number INTEGER);
        CREATE TABLE audit_log (entry TEXT);
    ";
    let catalog = SchemaCatalog::from_ddl(ddl)?;
    assert!(catalog.is_valid_column(QueryKind::Meeting, "room"));
    assert!(!catalog.is_valid_column(QueryKind::Meeting, "start_time"));
    assert_eq!(catalog.date_column(QueryKind::Meeting), Some("meeting_date"));

    let fks = catalog.foreign_keys();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].from_table, "meeting_summaries");
    assert_eq!(fks[0].to_columns, vec!["number".to_string()]);
    Ok(())
}

#[test]
fn ddl_missing_a_table_is_rejected() {
    let ddl = "CREATE TABLE meetings (number INTEGER);";
    let err = SchemaCatalog::from_ddl(ddl).unwrap_err();
    assert!(err.to_string().contains("meeting_summaries"));
}
