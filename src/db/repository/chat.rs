use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row};
use tracing::debug;

use super::{fmt_datetime, parse_datetime, MAX_TS, MIN_TS};
use crate::db::StorageError;
use crate::models::{Message, MessageAttachment};
use chrono::NaiveDateTime;

/// Canonical conversation key for a participant set.
///
/// Input order and duplicates never affect the key: `[3, 1, 2]` and
/// `[1, 2, 3]` both map to `"1,2,3"`.
pub fn chat_key(user_ids: &[i64]) -> String {
    let ids: BTreeSet<i64> = user_ids.iter().copied().collect();
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Append a message to the conversation addressed by `recipients`.
///
/// The sender always counts as a participant, so sending to `[2, 3]` and to
/// `[1, 2, 3]` from user 1 lands in the same conversation.
pub fn log_message(
    conn: &Connection,
    recipients: &[i64],
    message: &Message,
) -> Result<Message, StorageError> {
    if message.message_id.is_some() {
        return Err(StorageError::Validation(
            "message_id is assigned by the store and must be unset on log".into(),
        ));
    }
    if recipients.is_empty() {
        return Err(StorageError::Validation(
            "a message needs at least one recipient".into(),
        ));
    }
    let has_other_recipient = recipients.iter().any(|id| *id != message.from_user);
    if !has_other_recipient {
        return Err(StorageError::Validation(
            "a message cannot be addressed only to its sender".into(),
        ));
    }
    if message.text.is_empty() && message.attachments.is_empty() {
        return Err(StorageError::Validation(
            "a message needs text or at least one attachment".into(),
        ));
    }

    let mut participants = recipients.to_vec();
    participants.push(message.from_user);
    let key = chat_key(&participants);

    conn.execute(
        "INSERT INTO chat_messages (chat_key, from_user, sent_at, text, attachments)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            key,
            message.from_user,
            fmt_datetime(&message.sent_at),
            message.text,
            serde_json::to_string(&message.attachments)?,
        ],
    )?;
    debug!("Logged message to chat {key}");

    let mut stored = message.clone();
    stored.message_id = Some(conn.last_insert_rowid());
    Ok(stored)
}

/// The last `limit` messages in the conversation at or before `until`
/// (`None` = no upper bound), returned oldest to newest.
pub fn latest_messages(
    conn: &Connection,
    user_ids: &[i64],
    until: Option<NaiveDateTime>,
    limit: u32,
) -> Result<Vec<Message>, StorageError> {
    if limit == 0 {
        return Err(StorageError::Validation("limit must be greater than 0".into()));
    }
    let key = chat_key(user_ids);
    let until = until.map_or_else(|| MAX_TS.to_string(), |ts| fmt_datetime(&ts));

    let mut stmt = conn.prepare(
        "SELECT message_id, from_user, sent_at, text, attachments FROM chat_messages
         WHERE chat_key = ?1 AND sent_at <= ?2
         ORDER BY sent_at DESC, message_id DESC LIMIT ?3",
    )?;
    let rows: Vec<MessageRow> = stmt
        .query_map(params![key, until, limit], message_columns)?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    let mut messages = rows
        .into_iter()
        .map(message_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    messages.reverse();
    Ok(messages)
}

/// Messages in the conversation within an optional closed time range,
/// oldest to newest.
pub fn messages_in_range(
    conn: &Connection,
    user_ids: &[i64],
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
) -> Result<Vec<Message>, StorageError> {
    let key = chat_key(user_ids);
    let since = since.map_or_else(|| MIN_TS.to_string(), |ts| fmt_datetime(&ts));
    let until = until.map_or_else(|| MAX_TS.to_string(), |ts| fmt_datetime(&ts));

    let mut stmt = conn.prepare(
        "SELECT message_id, from_user, sent_at, text, attachments FROM chat_messages
         WHERE chat_key = ?1 AND sent_at >= ?2 AND sent_at <= ?3
         ORDER BY sent_at, message_id",
    )?;
    let rows: Vec<MessageRow> = stmt
        .query_map(params![key, since, until], message_columns)?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    rows.into_iter().map(message_from_row).collect()
}

struct MessageRow {
    message_id: i64,
    from_user: i64,
    sent_at: String,
    text: String,
    attachments: String,
}

fn message_columns(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        message_id: row.get(0)?,
        from_user: row.get(1)?,
        sent_at: row.get(2)?,
        text: row.get(3)?,
        attachments: row.get(4)?,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message, StorageError> {
    let attachments: Vec<MessageAttachment> = serde_json::from_str(&row.attachments)?;
    Ok(Message {
        message_id: Some(row.message_id),
        from_user: row.from_user,
        sent_at: parse_datetime("sent_at", &row.sent_at)?,
        text: row.text,
        attachments,
    })
}
