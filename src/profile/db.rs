//! Persistence of the configuration tree in the store database.
//!
//! Each profile is one row holding its folders as a JSON document, so a
//! rewrite of the whole tree can share a transaction with audio inserts.

use rusqlite::{Connection, params};
use tracing::{debug, instrument};

use super::schema::Profile;
use crate::error::{Result, SbError, db_err};
use crate::store::SoundboardDb;

/// Load/save contract for the configuration tree.
pub trait ProfileStore {
    /// All profiles in their saved order.
    fn load_profiles(&self) -> Result<Vec<Profile>>;

    /// Replaces the stored tree with `profiles`.
    fn save_profiles(&self, profiles: &[Profile]) -> Result<()>;

    /// Inserts or replaces a single profile, appending new ones at the end.
    fn upsert_profile(&self, profile: &Profile) -> Result<()>;
}

impl ProfileStore for Connection {
    #[instrument(skip(self))]
    fn load_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self
            .prepare("SELECT id, document FROM profile ORDER BY sort_order, id")
            .map_err(db_err("Failed to prepare statement"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(db_err("Failed to query profiles"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("Failed to collect profiles"))?;

        let profiles = rows
            .into_iter()
            .map(|(id, document)| {
                serde_json::from_str::<Profile>(&document).map_err(|e| SbError::InvalidProfile {
                    profile: id,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = profiles.len(), "Loaded profiles");
        Ok(profiles)
    }

    #[instrument(skip_all, fields(count = profiles.len()))]
    fn save_profiles(&self, profiles: &[Profile]) -> Result<()> {
        self.execute("DELETE FROM profile", [])
            .map_err(db_err("Failed to clear profiles"))?;
        for (order, profile) in profiles.iter().enumerate() {
            let document = encode(profile)?;
            self.execute(
                "INSERT INTO profile (id, name, sort_order, document) VALUES (?1, ?2, ?3, ?4)",
                params![profile.id, profile.name, order as i64, document],
            )
            .map_err(db_err("Failed to save profile"))?;
        }
        debug!("Saved profiles");
        Ok(())
    }

    fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let document = encode(profile)?;
        self.execute(
            "INSERT INTO profile (id, name, sort_order, document)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM profile), ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, document = excluded.document",
            params![profile.id, profile.name, document],
        )
        .map_err(db_err("Failed to save profile"))?;
        Ok(())
    }
}

impl ProfileStore for SoundboardDb {
    fn load_profiles(&self) -> Result<Vec<Profile>> {
        self.live()?.load_profiles()
    }

    /// Replaces the stored tree in one transaction; on error the previous
    /// tree is kept.
    fn save_profiles(&self, profiles: &[Profile]) -> Result<()> {
        let tx = self
            .live()?
            .unchecked_transaction()
            .map_err(db_err("Failed to start transaction"))?;
        tx.save_profiles(profiles)?;
        tx.commit().map_err(db_err("Failed to commit profiles"))
    }

    fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.live()?.upsert_profile(profile)
    }
}

fn encode(profile: &Profile) -> Result<String> {
    serde_json::to_string(profile).map_err(|e| SbError::InvalidProfile {
        profile: profile.id.clone(),
        reason: e.to_string(),
    })
}
