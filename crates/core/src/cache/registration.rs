//! Persisted shell registration.
//!
//! Records which version is currently active for this cache database so a
//! newly installed version can tell whether it must wait.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const ACTIVE_VERSION: &str = "active_version";

impl CacheDb {
    /// Version currently recorded as active, if any.
    pub async fn active_version(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value FROM registration WHERE key = ?1",
                    params![ACTIVE_VERSION],
                    |row| row.get(0),
                );

                match result {
                    Ok(version) => Ok(Some(version)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record `version` as the active version.
    pub async fn set_active_version(&self, version: &str) -> Result<(), Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registration (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![ACTIVE_VERSION, version, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_active_version_roundtrip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.active_version().await.unwrap(), None);

        db.set_active_version("v1").await.unwrap();
        db.set_active_version("v2").await.unwrap();
        assert_eq!(db.active_version().await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_clear_all_keeps_registration() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_active_version("v1").await.unwrap();
        db.clear_all().await.unwrap();
        assert_eq!(db.active_version().await.unwrap().as_deref(), Some("v1"));
    }
}
