use std::collections::BTreeMap;

use rusqlite::Connection;

use crate::error::PrefsError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS default_providers (
        identity TEXT PRIMARY KEY,
        provider TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS app_settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

pub(crate) const DO_NOT_SHOW_FILE_REMOVE_WARNING: &str = "do_not_show_file_remove_warning";
pub(crate) const FILE_LIST_VIEW_TYPE: &str = "file_list_view_type";
pub(crate) const LANGUAGE: &str = "language";

pub(crate) fn open_prefs_db(data_dir: &str) -> Result<Connection, PrefsError> {
    let path = std::path::Path::new(data_dir).join("prefs.sqlite3");
    let conn = Connection::open(&path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

pub(crate) fn load_default_providers(conn: &Connection) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut stmt = match conn.prepare("SELECT identity, provider FROM default_providers") {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(%e, "failed to prepare default provider query");
            return map;
        }
    };
    let rows = match stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    }) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(%e, "failed to query default providers");
            return map;
        }
    };
    for (identity, provider) in rows.flatten() {
        map.insert(identity, provider);
    }
    map
}

pub(crate) fn save_default_provider(conn: &Connection, identity: &str, provider: &str) {
    if let Err(e) = conn.execute(
        "INSERT INTO default_providers (identity, provider)
         VALUES (?1, ?2)
         ON CONFLICT(identity) DO UPDATE SET provider = excluded.provider",
        [identity, provider],
    ) {
        tracing::warn!(%e, identity, "failed to save default provider");
    }
}

pub(crate) fn load_setting(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT value FROM app_settings WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .ok()
}

pub(crate) fn save_setting(conn: &Connection, key: &str, value: &str) {
    if let Err(e) = conn.execute(
        "INSERT INTO app_settings (key, value)
         VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    ) {
        tracing::warn!(%e, key, "failed to save setting");
    }
}

pub(crate) fn load_flag(conn: &Connection, key: &str) -> bool {
    load_setting(conn, key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE"))
        .unwrap_or(false)
}

pub(crate) fn save_flag(conn: &Connection, key: &str, enabled: bool) {
    save_setting(conn, key, if enabled { "1" } else { "0" });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn default_provider_roundtrip() {
        let conn = test_db();
        assert!(load_default_providers(&conn).is_empty());

        save_default_provider(&conn, "0xme", "0xsp1");
        save_default_provider(&conn, "0xyou", "0xsp2");
        save_default_provider(&conn, "0xme", "0xsp3");

        let map = load_default_providers(&conn);
        assert_eq!(map.len(), 2);
        assert_eq!(map["0xme"], "0xsp3");
        assert_eq!(map["0xyou"], "0xsp2");
    }

    #[test]
    fn flag_roundtrip() {
        let conn = test_db();
        assert!(!load_flag(&conn, DO_NOT_SHOW_FILE_REMOVE_WARNING));
        save_flag(&conn, DO_NOT_SHOW_FILE_REMOVE_WARNING, true);
        assert!(load_flag(&conn, DO_NOT_SHOW_FILE_REMOVE_WARNING));
        save_flag(&conn, DO_NOT_SHOW_FILE_REMOVE_WARNING, false);
        assert!(!load_flag(&conn, DO_NOT_SHOW_FILE_REMOVE_WARNING));
    }

    #[test]
    fn settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        {
            let conn = open_prefs_db(&data_dir).unwrap();
            save_setting(&conn, LANGUAGE, "de");
        }
        let conn = open_prefs_db(&data_dir).unwrap();
        assert_eq!(load_setting(&conn, LANGUAGE).as_deref(), Some("de"));
        assert!(load_setting(&conn, FILE_LIST_VIEW_TYPE).is_none());
    }
}
