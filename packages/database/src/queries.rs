//! Raw SQL for the incident tables.
//!
//! Every function takes a `&dyn Database` so it can run either on a pooled
//! connection or inside a transaction. Spatial predicates use `PostGIS`
//! functions through `query_raw_params()`.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};
use denuncia_database_models::{
    CategoryMatch, DenunciaFilter, DenunciaRow, HistorySnapshot, SortOrder, UserIdentity,
    UserRole, Window,
};
use denuncia_models::RecordedStatus;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};
use uuid::Uuid;

use crate::DbError;

const DENUNCIA_COLUMNS: &str = "id, protocolo, categoria, descricao, midia, audio, status,
        reporter_id, assigned_to, created_at, updated_at,
        ST_X(localizacao) AS longitude, ST_Y(localizacao) AS latitude";

const SNAPSHOT_COLUMNS: &str =
    "sequence, denuncia_id, categoria, descricao, status, assigned_to, actor_id, recorded_at";

fn conversion(column: &str, e: impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to parse column {column}: {e}"),
    }
}

fn uuid_value(id: Uuid) -> DatabaseValue {
    DatabaseValue::String(id.to_string())
}

fn optional_uuid_value(id: Option<Uuid>) -> DatabaseValue {
    id.map_or(DatabaseValue::Null, uuid_value)
}

fn optional_string_value(value: Option<&String>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |v| DatabaseValue::String(v.clone()))
}

fn window_value(value: u64) -> DatabaseValue {
    DatabaseValue::Int64(i64::try_from(value).unwrap_or(i64::MAX))
}

fn read_uuid(row: &Row, column: &str) -> Result<Uuid, DbError> {
    let raw: String = row.to_value(column).map_err(|e| conversion(column, e))?;
    Uuid::parse_str(&raw).map_err(|e| conversion(column, e))
}

fn read_optional_uuid(row: &Row, column: &str) -> Result<Option<Uuid>, DbError> {
    let raw: Option<String> = row.to_value(column).map_err(|e| conversion(column, e))?;
    raw.map(|value| Uuid::parse_str(&value).map_err(|e| conversion(column, e)))
        .transpose()
}

fn read_timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, DbError> {
    let naive: NaiveDateTime = row.to_value(column).map_err(|e| conversion(column, e))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn read_total(row: &Row) -> Result<u64, DbError> {
    let total: i64 = row.to_value("total").map_err(|e| conversion("total", e))?;
    u64::try_from(total).map_err(|e| conversion("total", e))
}

fn parse_denuncia(row: &Row) -> Result<DenunciaRow, DbError> {
    let status: String = row.to_value("status").map_err(|e| conversion("status", e))?;
    Ok(DenunciaRow {
        id: read_uuid(row, "id")?,
        protocolo: row
            .to_value("protocolo")
            .map_err(|e| conversion("protocolo", e))?,
        categoria: row
            .to_value("categoria")
            .map_err(|e| conversion("categoria", e))?,
        descricao: row
            .to_value("descricao")
            .map_err(|e| conversion("descricao", e))?,
        longitude: row
            .to_value("longitude")
            .map_err(|e| conversion("longitude", e))?,
        latitude: row
            .to_value("latitude")
            .map_err(|e| conversion("latitude", e))?,
        midia: row.to_value("midia").map_err(|e| conversion("midia", e))?,
        audio: row.to_value("audio").map_err(|e| conversion("audio", e))?,
        status: RecordedStatus::from(status),
        reporter_id: read_optional_uuid(row, "reporter_id")?,
        assigned_to: read_optional_uuid(row, "assigned_to")?,
        created_at: read_timestamp(row, "created_at")?,
        updated_at: read_timestamp(row, "updated_at")?,
    })
}

fn parse_snapshot(row: &Row) -> Result<HistorySnapshot, DbError> {
    let status: String = row.to_value("status").map_err(|e| conversion("status", e))?;
    Ok(HistorySnapshot {
        sequence: row
            .to_value("sequence")
            .map_err(|e| conversion("sequence", e))?,
        denuncia_id: read_uuid(row, "denuncia_id")?,
        categoria: row
            .to_value("categoria")
            .map_err(|e| conversion("categoria", e))?,
        descricao: row
            .to_value("descricao")
            .map_err(|e| conversion("descricao", e))?,
        status: RecordedStatus::from(status),
        assigned_to: read_optional_uuid(row, "assigned_to")?,
        actor_id: read_optional_uuid(row, "actor_id")?,
        recorded_at: read_timestamp(row, "recorded_at")?,
    })
}

/// Unknown roles are an error rather than a silent downgrade.
fn parse_role(raw: &str) -> Result<UserRole, DbError> {
    match raw {
        "user" => Ok(UserRole::User),
        "staff" => Ok(UserRole::Staff),
        "admin" => Ok(UserRole::Admin),
        other => Err(conversion("role", format!("unknown role {other:?}"))),
    }
}

fn parse_user(row: &Row) -> Result<UserIdentity, DbError> {
    let role: String = row.to_value("role").map_err(|e| conversion("role", e))?;
    Ok(UserIdentity {
        id: read_uuid(row, "id")?,
        name: row.to_value("name").map_err(|e| conversion("name", e))?,
        email: row.to_value("email").map_err(|e| conversion("email", e))?,
        is_active: row
            .to_value("is_active")
            .map_err(|e| conversion("is_active", e))?,
        role: parse_role(&role)?,
    })
}

const fn role_value(role: UserRole) -> &'static str {
    match role {
        UserRole::User => "user",
        UserRole::Staff => "staff",
        UserRole::Admin => "admin",
    }
}

/// Appends the `WHERE` conditions for `filter` to `sql`, numbering
/// placeholders from `param_idx`. Returns the next free placeholder index.
fn push_filter(
    sql: &mut String,
    params: &mut Vec<DatabaseValue>,
    filter: &DenunciaFilter,
    mut param_idx: u32,
) -> u32 {
    if let Some(bbox) = &filter.bbox {
        let _ = write!(
            sql,
            " AND ST_Intersects(localizacao, ST_MakeEnvelope(${}, ${}, ${}, ${}, 4326))",
            param_idx,
            param_idx + 1,
            param_idx + 2,
            param_idx + 3,
        );
        params.push(DatabaseValue::Real64(bbox.west));
        params.push(DatabaseValue::Real64(bbox.south));
        params.push(DatabaseValue::Real64(bbox.east));
        params.push(DatabaseValue::Real64(bbox.north));
        param_idx += 4;
    }

    if let Some(from) = &filter.created_from {
        let _ = write!(sql, " AND created_at >= ${param_idx}");
        params.push(DatabaseValue::DateTime(from.naive_utc()));
        param_idx += 1;
    }

    if let Some(to) = &filter.created_to {
        let _ = write!(sql, " AND created_at <= ${param_idx}");
        params.push(DatabaseValue::DateTime(to.naive_utc()));
        param_idx += 1;
    }

    if let Some(status) = &filter.status {
        let _ = write!(sql, " AND status = ${param_idx}");
        params.push(DatabaseValue::String(status.clone()));
        param_idx += 1;
    }

    match &filter.category {
        Some(CategoryMatch::Exact(categoria)) => {
            let _ = write!(sql, " AND LOWER(categoria) = LOWER(${param_idx})");
            params.push(DatabaseValue::String(categoria.clone()));
            param_idx += 1;
        }
        Some(CategoryMatch::Contains(categoria)) => {
            let _ = write!(sql, " AND STRPOS(LOWER(categoria), LOWER(${param_idx})) > 0");
            params.push(DatabaseValue::String(categoria.clone()));
            param_idx += 1;
        }
        None => {}
    }

    param_idx
}

/// Inserts an incident row. Returns `false` when the protocol code is
/// already taken, in which case nothing was written.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_denuncia(db: &dyn Database, row: &DenunciaRow) -> Result<bool, DbError> {
    let inserted = db
        .exec_raw_params(
            "INSERT INTO denuncias (
                id, protocolo, categoria, descricao, localizacao, midia, audio,
                status, reporter_id, assigned_to, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4,
                ST_SetSRID(ST_MakePoint($5, $6), 4326),
                $7, $8, $9, $10, $11, $12, $13
            )
            ON CONFLICT (protocolo) DO NOTHING",
            &[
                uuid_value(row.id),
                DatabaseValue::String(row.protocolo.clone()),
                DatabaseValue::String(row.categoria.clone()),
                DatabaseValue::String(row.descricao.clone()),
                DatabaseValue::Real64(row.longitude),
                DatabaseValue::Real64(row.latitude),
                optional_string_value(row.midia.as_ref()),
                optional_string_value(row.audio.as_ref()),
                DatabaseValue::String(row.status.to_string()),
                optional_uuid_value(row.reporter_id),
                optional_uuid_value(row.assigned_to),
                DatabaseValue::DateTime(row.created_at.naive_utc()),
                DatabaseValue::DateTime(row.updated_at.naive_utc()),
            ],
        )
        .await?;

    Ok(inserted > 0)
}

/// Overwrites every mutable column of an existing incident.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn update_denuncia(db: &dyn Database, row: &DenunciaRow) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE denuncias SET
            categoria = $2,
            descricao = $3,
            localizacao = ST_SetSRID(ST_MakePoint($4, $5), 4326),
            midia = $6,
            audio = $7,
            status = $8,
            assigned_to = $9,
            updated_at = $10
         WHERE id = $1",
        &[
            uuid_value(row.id),
            DatabaseValue::String(row.categoria.clone()),
            DatabaseValue::String(row.descricao.clone()),
            DatabaseValue::Real64(row.longitude),
            DatabaseValue::Real64(row.latitude),
            optional_string_value(row.midia.as_ref()),
            optional_string_value(row.audio.as_ref()),
            DatabaseValue::String(row.status.to_string()),
            optional_uuid_value(row.assigned_to),
            DatabaseValue::DateTime(row.updated_at.naive_utc()),
        ],
    )
    .await?;

    Ok(())
}

/// Appends a history snapshot of `row`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_snapshot(
    db: &dyn Database,
    row: &DenunciaRow,
    actor_id: Option<Uuid>,
    recorded_at: DateTime<Utc>,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO denuncia_history (
            denuncia_id, categoria, descricao, status, assigned_to, actor_id, recorded_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            uuid_value(row.id),
            DatabaseValue::String(row.categoria.clone()),
            DatabaseValue::String(row.descricao.clone()),
            DatabaseValue::String(row.status.to_string()),
            optional_uuid_value(row.assigned_to),
            optional_uuid_value(actor_id),
            DatabaseValue::DateTime(recorded_at.naive_utc()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches one incident by id, locking the row when `for_update` is set.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_denuncia(
    db: &dyn Database,
    id: Uuid,
    for_update: bool,
) -> Result<Option<DenunciaRow>, DbError> {
    let mut sql = format!("SELECT {DENUNCIA_COLUMNS} FROM denuncias WHERE id = $1");
    if for_update {
        sql.push_str(" FOR UPDATE");
    }
    let rows = db.query_raw_params(&sql, &[uuid_value(id)]).await?;
    rows.first().map(parse_denuncia).transpose()
}

/// Fetches one incident by protocol code.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_denuncia_by_protocol(
    db: &dyn Database,
    protocolo: &str,
) -> Result<Option<DenunciaRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {DENUNCIA_COLUMNS} FROM denuncias WHERE protocolo = $1"),
            &[DatabaseValue::String(protocolo.to_string())],
        )
        .await?;
    rows.first().map(parse_denuncia).transpose()
}

/// Deletes one incident. Returns whether a row was removed.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_denuncia(db: &dyn Database, id: Uuid) -> Result<bool, DbError> {
    let deleted = db
        .exec_raw_params("DELETE FROM denuncias WHERE id = $1", &[uuid_value(id)])
        .await?;
    Ok(deleted > 0)
}

/// Queries incidents matching `filter`, ordered and windowed.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_denuncias(
    db: &dyn Database,
    filter: &DenunciaFilter,
    order: SortOrder,
    window: Window,
) -> Result<Vec<DenunciaRow>, DbError> {
    let mut sql = format!("SELECT {DENUNCIA_COLUMNS} FROM denuncias WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = push_filter(&mut sql, &mut params, filter, 1);

    sql.push_str(match order {
        SortOrder::CreatedDesc => " ORDER BY created_at DESC, id DESC",
        SortOrder::CreatedAsc => " ORDER BY created_at ASC, id ASC",
    });

    if let Some(limit) = window.limit {
        let _ = write!(sql, " LIMIT ${param_idx}");
        params.push(window_value(limit));
        param_idx += 1;
    }

    let _ = write!(sql, " OFFSET ${param_idx}");
    params.push(window_value(window.offset));

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.iter().map(parse_denuncia).collect()
}

/// Counts incidents matching `filter`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_denuncias(db: &dyn Database, filter: &DenunciaFilter) -> Result<u64, DbError> {
    let mut sql = String::from("SELECT COUNT(*) AS total FROM denuncias WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();
    push_filter(&mut sql, &mut params, filter, 1);

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.first().map_or(Ok(0), read_total)
}

/// Counts incidents matching `filter` grouped by raw status value.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_by_status(
    db: &dyn Database,
    filter: &DenunciaFilter,
) -> Result<Vec<(RecordedStatus, u64)>, DbError> {
    let mut sql = String::from("SELECT status, COUNT(*) AS total FROM denuncias WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();
    push_filter(&mut sql, &mut params, filter, 1);
    sql.push_str(" GROUP BY status ORDER BY status");

    let rows = db.query_raw_params(&sql, &params).await?;
    let mut counts = Vec::with_capacity(rows.len());
    for row in &rows {
        let status: String = row.to_value("status").map_err(|e| conversion("status", e))?;
        counts.push((RecordedStatus::from(status), read_total(row)?));
    }
    Ok(counts)
}

/// Returns every snapshot of one incident, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_snapshots(
    db: &dyn Database,
    denuncia_id: Uuid,
) -> Result<Vec<HistorySnapshot>, DbError> {
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM denuncia_history
                 WHERE denuncia_id = $1
                 ORDER BY recorded_at DESC, sequence DESC"
            ),
            &[uuid_value(denuncia_id)],
        )
        .await?;
    rows.iter().map(parse_snapshot).collect()
}

/// Looks up a user projection by id.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn find_user(db: &dyn Database, id: Uuid) -> Result<Option<UserIdentity>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, email, is_active, role FROM denuncia_users WHERE id = $1",
            &[uuid_value(id)],
        )
        .await?;
    rows.first().map(parse_user).transpose()
}

/// Counts active user accounts.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_active_users(db: &dyn Database) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) AS total FROM denuncia_users WHERE is_active",
            &[],
        )
        .await?;
    rows.first().map_or(Ok(0), read_total)
}

/// Inserts or replaces a user projection.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn upsert_user(db: &dyn Database, user: &UserIdentity) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO denuncia_users (id, name, email, is_active, role)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
             name = EXCLUDED.name,
             email = EXCLUDED.email,
             is_active = EXCLUDED.is_active,
             role = EXCLUDED.role",
        &[
            uuid_value(user.id),
            DatabaseValue::String(user.name.clone()),
            DatabaseValue::String(user.email.clone()),
            DatabaseValue::Bool(user.is_active),
            DatabaseValue::String(role_value(user.role).to_string()),
        ],
    )
    .await?;

    Ok(())
}
