use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    error::{BursaryError, Result},
    models::{Identity, Role},
    storage::models::SessionRecord,
};

/// Local SQLite file holding at most one signed-in session
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        // The CHECK pins the table to a single row
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                display_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                role TEXT NOT NULL,
                email TEXT NOT NULL,
                national_id TEXT NOT NULL,
                token TEXT,
                signed_in_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub fn save_session(&self, record: &SessionRecord) -> Result<()> {
        let identity = &record.identity;
        self.conn.execute(
            "INSERT OR REPLACE INTO session
             (id, display_name, phone, role, email, national_id, token, signed_in_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                identity.display_name,
                identity.phone,
                identity.role.as_str(),
                identity.email,
                identity.national_id,
                identity.token,
                record.signed_in_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn load_session(&self) -> Result<Option<SessionRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT display_name, phone, role, email, national_id, token, signed_in_at
                 FROM session WHERE id = 1",
                [],
                |row| {
                    Ok((
                        Identity {
                            display_name: row.get(0)?,
                            phone: row.get(1)?,
                            role: Role::from(row.get::<_, String>(2)?),
                            email: row.get(3)?,
                            national_id: row.get(4)?,
                            token: row.get(5)?,
                        },
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(identity, signed_in_at)| -> Result<SessionRecord> {
            let signed_in_at = DateTime::parse_from_rfc3339(&signed_in_at)
                .map_err(|e| BursaryError::Config(format!("corrupt session timestamp: {}", e)))?
                .with_timezone(&Utc);
            Ok(SessionRecord::new(identity, signed_in_at))
        })
        .transpose()
    }

    /// The signed-in identity, or `Unauthorized` when nobody is signed in
    pub fn require_session(&self) -> Result<Identity> {
        self.load_session()?
            .map(|record| record.identity)
            .ok_or_else(|| {
                BursaryError::Unauthorized("not signed in; run `bursary-admin login`".to_string())
            })
    }

    /// Returns whether a session existed
    pub fn clear_session(&self) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM session", [])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::{applicant_identity, staff_identity};
    use chrono::TimeZone;

    fn signed_in_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_session_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");
        let path = path.to_str().unwrap();

        let record = SessionRecord::new(staff_identity(), signed_in_at());
        Database::new(path).unwrap().save_session(&record).unwrap();

        // reopen to make sure it hit disk
        let loaded = Database::new(path).unwrap().load_session().unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn test_new_login_replaces_previous() {
        let db = Database::in_memory().unwrap();
        db.save_session(&SessionRecord::new(staff_identity(), signed_in_at()))
            .unwrap();
        db.save_session(&SessionRecord::new(applicant_identity(), signed_in_at()))
            .unwrap();

        let identity = db.require_session().unwrap();
        assert_eq!(identity.role, Role::Applicant);
        assert_eq!(identity.display_name, "Brian Otieno");
    }

    #[test]
    fn test_logout_clears_session() {
        let db = Database::in_memory().unwrap();
        assert!(!db.clear_session().unwrap());

        db.save_session(&SessionRecord::new(staff_identity(), signed_in_at()))
            .unwrap();
        assert!(db.clear_session().unwrap());
        assert!(db.load_session().unwrap().is_none());
        assert!(matches!(
            db.require_session(),
            Err(BursaryError::Unauthorized(_))
        ));
    }
}
