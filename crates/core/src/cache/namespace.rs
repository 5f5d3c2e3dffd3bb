//! Versioned cache namespaces.
//!
//! A namespace is identified by a structured `{version, tier}` key rather
//! than a name prefix, so `v1` never matches `v10`. The rendered name
//! `<version>-<tier>` exists only for display and external reporting.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_rusqlite::params;

/// Cache tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Populated once from the precache manifest during install.
    Static,
    /// Grows lazily from successful network responses.
    Dynamic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Static => "static",
            Tier::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Tier::Static),
            "dynamic" => Ok(Tier::Dynamic),
            other => Err(Error::CorruptEntry(format!("unknown tier: {other}"))),
        }
    }
}

/// Structured namespace identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceKey {
    pub version: String,
    pub tier: Tier,
}

impl NamespaceKey {
    pub fn new(version: impl Into<String>, tier: Tier) -> Self {
        Self { version: version.into(), tier }
    }

    pub fn static_tier(version: &str) -> Self {
        Self::new(version, Tier::Static)
    }

    pub fn dynamic_tier(version: &str) -> Self {
        Self::new(version, Tier::Dynamic)
    }

    /// Rendered name, `<version>-<tier>`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.version, self.tier)
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.version, self.tier)
    }
}

/// Handle to an opened namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub(crate) id: i64,
    pub key: NamespaceKey,
}

impl Namespace {
    pub fn name(&self) -> String {
        self.key.name()
    }
}

/// Namespace listing with entry count.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NamespaceSummary {
    pub name: String,
    pub version: String,
    pub tier: Tier,
    pub entries: u64,
    pub created_at: String,
}

/// Insert the namespace row if absent and return its id.
pub(crate) fn ensure_namespace(conn: &tokio_rusqlite::rusqlite::Connection, key: &NamespaceKey) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO namespaces (version, tier, created_at) VALUES (?1, ?2, ?3)",
        params![key.version, key.tier.as_str(), chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row(
        "SELECT id FROM namespaces WHERE version = ?1 AND tier = ?2",
        params![key.version, key.tier.as_str()],
        |row| row.get(0),
    )?;
    Ok(id)
}

impl CacheDb {
    /// Open (creating if absent) the namespace for `key`.
    ///
    /// Idempotent: repeated opens return handles to the same rows.
    pub async fn open_namespace(&self, key: &NamespaceKey) -> Result<Namespace, Error> {
        let key = key.clone();
        self.conn
            .call(move |conn| -> Result<Namespace, Error> {
                let id = ensure_namespace(conn, &key)?;
                Ok(Namespace { id, key })
            })
            .await
            .map_err(Error::from)
    }

    /// List every namespace key in creation order.
    pub async fn namespace_keys(&self) -> Result<Vec<NamespaceKey>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<NamespaceKey>, Error> {
                let mut stmt = conn.prepare("SELECT version, tier FROM namespaces ORDER BY id ASC")?;
                let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

                let mut keys = Vec::new();
                for row in rows {
                    let (version, tier) = row?;
                    keys.push(NamespaceKey::new(version, tier.parse()?));
                }
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// List namespaces with their entry counts.
    pub async fn namespace_summaries(&self) -> Result<Vec<NamespaceSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<NamespaceSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT n.version, n.tier, n.created_at, COUNT(e.key_hash)
                     FROM namespaces n LEFT JOIN entries e ON e.namespace_id = n.id
                     GROUP BY n.id ORDER BY n.id ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })?;

                let mut summaries = Vec::new();
                for row in rows {
                    let (version, tier, created_at, entries) = row?;
                    let key = NamespaceKey::new(version, tier.parse()?);
                    summaries.push(NamespaceSummary {
                        name: key.name(),
                        version: key.version,
                        tier: key.tier,
                        entries: entries as u64,
                        created_at,
                    });
                }
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every namespace not listed in `keep`.
    ///
    /// Returns the keys that were removed.
    pub async fn sweep(&self, keep: &[NamespaceKey]) -> Result<Vec<NamespaceKey>, Error> {
        let keep = keep.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<NamespaceKey>, Error> {
                let tx = conn.transaction()?;
                let mut stale = Vec::new();
                {
                    let mut stmt = tx.prepare("SELECT version, tier FROM namespaces ORDER BY id ASC")?;
                    let rows =
                        stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
                    for row in rows {
                        let (version, tier) = row?;
                        let key = NamespaceKey::new(version, tier.parse()?);
                        if !keep.contains(&key) {
                            stale.push(key);
                        }
                    }
                }

                for key in &stale {
                    tx.execute(
                        "DELETE FROM namespaces WHERE version = ?1 AND tier = ?2",
                        params![key.version, key.tier.as_str()],
                    )?;
                }
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every namespace regardless of version.
    ///
    /// Returns the number of namespaces removed.
    pub async fn clear_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM namespaces", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
