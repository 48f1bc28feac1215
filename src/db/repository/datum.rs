use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{fmt_datetime, parse_datetime, MAX_TS, MIN_TS};
use crate::db::StorageError;
use crate::models::{Datum, DatumValue};
use chrono::NaiveDateTime;

pub fn create_datum(conn: &Connection, datum: &Datum) -> Result<Datum, StorageError> {
    if datum.datum_id.is_some() {
        return Err(StorageError::Validation(
            "datum_id is assigned by the store and must be unset on create".into(),
        ));
    }

    conn.execute(
        "INSERT INTO device_data
         (device_id, assigned_user, data_type, payload, collection_time, received_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            datum.device_id,
            datum.assigned_user,
            datum.value.data_type(),
            serde_json::to_string(&datum.value)?,
            fmt_datetime(&datum.collection_time),
            fmt_datetime(&datum.received_time),
        ],
    )?;

    let mut stored = datum.clone();
    stored.datum_id = Some(conn.last_insert_rowid());
    Ok(stored)
}

/// Store a batch of measurements in one transaction. A device upload either
/// lands entirely or not at all.
pub fn create_data(conn: &Connection, data: &[Datum]) -> Result<Vec<Datum>, StorageError> {
    let tx = conn.unchecked_transaction()?;
    let mut stored = Vec::with_capacity(data.len());
    for datum in data {
        stored.push(create_datum(&tx, datum)?);
    }
    tx.commit()?;
    debug!("Stored {} data points", stored.len());
    Ok(stored)
}

pub fn get_datum(conn: &Connection, datum_id: i64) -> Result<Option<Datum>, StorageError> {
    let row = conn
        .query_row(
            "SELECT datum_id, device_id, assigned_user, payload, collection_time, received_time
             FROM device_data WHERE datum_id = ?1",
            params![datum_id],
            datum_columns,
        )
        .optional()?;

    match row {
        Some(row) => Ok(Some(datum_from_row(row)?)),
        None => Ok(None),
    }
}

/// Measurements for a user, oldest first, within an optional closed range
/// over `collection_time`.
pub fn data_for_user(
    conn: &Connection,
    user_id: i64,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
) -> Result<Vec<Datum>, StorageError> {
    query_data(
        conn,
        "SELECT datum_id, device_id, assigned_user, payload, collection_time, received_time
         FROM device_data
         WHERE assigned_user = ?1 AND collection_time >= ?2 AND collection_time <= ?3
         ORDER BY collection_time, datum_id",
        user_id,
        since,
        until,
    )
}

/// Measurements reported by a device, oldest first.
pub fn data_for_device(
    conn: &Connection,
    device_id: i64,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
) -> Result<Vec<Datum>, StorageError> {
    query_data(
        conn,
        "SELECT datum_id, device_id, assigned_user, payload, collection_time, received_time
         FROM device_data
         WHERE device_id = ?1 AND collection_time >= ?2 AND collection_time <= ?3
         ORDER BY collection_time, datum_id",
        device_id,
        since,
        until,
    )
}

fn query_data(
    conn: &Connection,
    sql: &str,
    key: i64,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
) -> Result<Vec<Datum>, StorageError> {
    let since = since.map_or_else(|| MIN_TS.to_string(), |ts| fmt_datetime(&ts));
    let until = until.map_or_else(|| MAX_TS.to_string(), |ts| fmt_datetime(&ts));

    let mut stmt = conn.prepare(sql)?;
    let rows: Vec<DatumRow> = stmt
        .query_map(params![key, since, until], datum_columns)?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    rows.into_iter().map(datum_from_row).collect()
}

struct DatumRow {
    datum_id: i64,
    device_id: i64,
    assigned_user: i64,
    payload: String,
    collection_time: String,
    received_time: String,
}

fn datum_columns(row: &Row) -> rusqlite::Result<DatumRow> {
    Ok(DatumRow {
        datum_id: row.get(0)?,
        device_id: row.get(1)?,
        assigned_user: row.get(2)?,
        payload: row.get(3)?,
        collection_time: row.get(4)?,
        received_time: row.get(5)?,
    })
}

fn datum_from_row(row: DatumRow) -> Result<Datum, StorageError> {
    let value: DatumValue = serde_json::from_str(&row.payload)?;
    Ok(Datum {
        datum_id: Some(row.datum_id),
        device_id: row.device_id,
        assigned_user: row.assigned_user,
        collection_time: parse_datetime("collection_time", &row.collection_time)?,
        received_time: parse_datetime("received_time", &row.received_time)?,
        value,
    })
}
