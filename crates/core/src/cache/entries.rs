//! Cache entry operations.
//!
//! Entries are keyed by `{namespace, request digest}` with last-write-wins
//! semantics. The store does not filter by status; callers decide what is
//! cacheable.

use super::connection::CacheDb;
use super::key::RequestKey;
use super::namespace::{Namespace, NamespaceKey, ensure_namespace};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A previously observed response: status, headers, and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StoredResponse {
    /// Whether the status is in the 2xx class.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Synthesized 503 with a plain-text body.
    pub fn service_unavailable(message: &str) -> Self {
        Self {
            status: 503,
            status_text: "Service Unavailable".into(),
            headers: vec![("content-type".into(), "text/plain; charset=utf-8".into())],
            body: message.as_bytes().to_vec(),
        }
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

fn insert_entry(conn: &rusqlite::Connection, namespace_id: i64, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT INTO entries (
            namespace_id, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(namespace_id, key_hash) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            namespace_id,
            key.digest(),
            &key.method,
            &key.url,
            response.status as i64,
            &response.status_text,
            headers_json,
            &response.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn decode_entry(row: (i64, String, String, Vec<u8>)) -> Result<StoredResponse, Error> {
    let (status, status_text, headers_json, body) = row;
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status out of range: {status}")))?;
    let headers = serde_json::from_str(&headers_json)?;
    Ok(StoredResponse { status, status_text, headers, body })
}

impl CacheDb {
    /// Store or overwrite an entry in an opened namespace.
    pub async fn put(&self, namespace: &Namespace, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        let namespace_id = namespace.id;
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert_entry(conn, namespace_id, &key, &response) })
            .await
            .map_err(Error::from)
    }

    /// Store an entry, creating the namespace on first write.
    ///
    /// Opening and writing happen in one transaction, so a namespace swept
    /// concurrently is recreated rather than written into a dangling id.
    pub async fn put_in(&self, namespace: &NamespaceKey, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        let namespace = namespace.clone();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let id = ensure_namespace(&tx, &namespace)?;
                insert_entry(&tx, id, &key, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of entries atomically: either all are visible or none.
    pub async fn put_all(&self, namespace: &Namespace, entries: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error> {
        let namespace_id = namespace.id;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (key, response) in &entries {
                    insert_entry(&tx, namespace_id, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry in a single namespace.
    pub async fn match_in(&self, namespace: &NamespaceKey, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let namespace = namespace.clone();
        let digest = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.status_text, e.headers_json, e.body
                     FROM entries e JOIN namespaces n ON n.id = e.namespace_id
                     WHERE n.version = ?1 AND n.tier = ?2 AND e.key_hash = ?3",
                    params![namespace.version, namespace.tier.as_str(), digest],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => decode_entry(row).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry in the first namespace of `namespaces` that holds it.
    pub async fn match_first(&self, namespaces: &[NamespaceKey], key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let namespaces = namespaces.to_vec();
        let digest = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.status_text, e.headers_json, e.body
                     FROM entries e JOIN namespaces n ON n.id = e.namespace_id
                     WHERE n.version = ?1 AND n.tier = ?2 AND e.key_hash = ?3",
                )?;
                for namespace in &namespaces {
                    let result = stmt.query_row(params![namespace.version, namespace.tier.as_str(), digest], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    });
                    match result {
                        Ok(row) => return decode_entry(row).map(Some),
                        Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(None)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry across every namespace.
    ///
    /// Dynamic tiers are searched before static ones and newer namespaces
    /// before older ones, so a refreshed copy shadows the precached one.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let digest = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.status_text, e.headers_json, e.body
                     FROM entries e JOIN namespaces n ON n.id = e.namespace_id
                     WHERE e.key_hash = ?1
                     ORDER BY CASE n.tier WHEN 'dynamic' THEN 0 ELSE 1 END, n.id DESC
                     LIMIT 1",
                    params![digest],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => decode_entry(row).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a namespace (zero if it does not exist).
    pub async fn entry_count(&self, namespace: &NamespaceKey) -> Result<u64, Error> {
        let namespace = namespace.clone();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e JOIN namespaces n ON n.id = e.namespace_id
                     WHERE n.version = ?1 AND n.tier = ?2",
                    params![namespace.version, namespace.tier.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
