//! Learner skill progress

use rusqlite::params;

use super::{has_role, new_id, Result, Store, StoreError};
use crate::types::Role;
use crate::models::progress::defaults;
use crate::models::{ProgressUpdate, SkillProgress};

impl Store {
    /// Progress rows for a learner, or the zeroed default skills when none
    /// have been recorded
    pub async fn progress_for(&self, learner_id: &str) -> Result<Vec<SkillProgress>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, learner_id, skill, percentage FROM progress WHERE learner_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![learner_id], |row| {
                Ok(SkillProgress {
                    id: Some(row.get(0)?),
                    learner_id: Some(row.get(1)?),
                    skill: row.get(2)?,
                    percentage: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if rows.is_empty() {
            return Ok(defaults());
        }
        Ok(rows)
    }

    /// Set a skill's percentage, replacing any earlier value
    pub async fn upsert_progress(&self, update: &ProgressUpdate) -> Result<()> {
        let percentage = update.validate()?;
        let conn = self.conn.lock().await;
        if !has_role(&conn, &update.learner_id, Role::Learner)? {
            return Err(StoreError::UnknownReference("learner"));
        }
        conn.execute(
            "INSERT INTO progress (id, learner_id, skill, percentage) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(learner_id, skill) DO UPDATE SET percentage = excluded.percentage",
            params![new_id(), update.learner_id, update.skill, percentage],
        )?;
        Ok(())
    }
}
