use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Bootstrap DDL. Имена проектов/поставщиков и номера накладных сравниваются
/// без учета регистра (COLLATE NOCASE), уникальность — в паре с tenant_id.
const TABLES: &[(&str, &str)] = &[
    (
        "a001_project",
        r#"
        CREATE TABLE a001_project (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL COLLATE NOCASE,
            created_at TEXT,
            updated_at TEXT,
            UNIQUE (tenant_id, name)
        );
        "#,
    ),
    (
        "a002_supplier",
        r#"
        CREATE TABLE a002_supplier (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL COLLATE NOCASE,
            created_at TEXT,
            updated_at TEXT,
            UNIQUE (tenant_id, name)
        );
        "#,
    ),
    (
        "a003_waybill",
        r#"
        CREATE TABLE a003_waybill (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            waybill_number TEXT NOT NULL COLLATE NOCASE,
            project_id TEXT NOT NULL,
            supplier_id TEXT NOT NULL,
            waybill_date TEXT NOT NULL,
            delivery_date TEXT NOT NULL,
            product_code TEXT NOT NULL,
            quantity REAL NOT NULL,
            unit_price REAL NOT NULL,
            total_amount REAL NOT NULL,
            status TEXT NOT NULL,
            row_version TEXT NOT NULL,
            created_at TEXT,
            updated_at TEXT,
            UNIQUE (tenant_id, waybill_number)
        );
        "#,
    ),
    (
        "a004_import_job",
        r#"
        CREATE TABLE a004_import_job (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            status TEXT NOT NULL,
            progress_percent INTEGER,
            total_rows INTEGER,
            inserted_count INTEGER,
            updated_count INTEGER,
            rejected_count INTEGER,
            error TEXT,
            created_at TEXT,
            updated_at TEXT
        );
        "#,
    ),
    (
        "a005_execution_lock",
        r#"
        CREATE TABLE a005_execution_lock (
            tenant_id TEXT NOT NULL,
            lock_name TEXT NOT NULL,
            acquired_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            acquired_by TEXT,
            PRIMARY KEY (tenant_id, lock_name)
        );
        "#,
    ),
    (
        "a006_import_audit",
        r#"
        CREATE TABLE a006_import_audit (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL,
            import_job_id TEXT NOT NULL,
            total_rows INTEGER NOT NULL,
            inserted_count INTEGER NOT NULL,
            updated_count INTEGER NOT NULL,
            rejected_count INTEGER NOT NULL,
            received_at TEXT NOT NULL
        );
        "#,
    ),
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/waybills.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    for (table, ddl) in TABLES {
        ensure_table(&conn, table, ddl).await?;
    }

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

async fn ensure_table(
    conn: &DatabaseConnection,
    table: &str,
    ddl: &str,
) -> anyhow::Result<()> {
    let check = format!(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='{}';",
        table
    );
    let existing = conn
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, check))
        .await?;

    if existing.is_empty() {
        tracing::info!("Creating {} table", table);
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await?;
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
