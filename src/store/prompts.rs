//! Chat prompt log

use chrono::Utc;
use rusqlite::params;

use super::{new_id, Result, Store, StoreError};
use crate::models::{NewPrompt, PromptLog};

impl Store {
    pub async fn log_prompt(&self, new: &NewPrompt) -> Result<PromptLog> {
        new.validate()?;
        let log = PromptLog {
            id: new_id(),
            user_id: new.user_id.clone(),
            command: new.command.clone(),
            response: new.response.clone(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        if let Some(user_id) = &log.user_id {
            let known: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                params![user_id],
                |row| row.get(0),
            )?;
            if !known {
                return Err(StoreError::UnknownReference("user"));
            }
        }
        conn.execute(
            "INSERT INTO prompts (id, user_id, command, response, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![log.id, log.user_id, log.command, log.response, log.created_at.to_rfc3339()],
        )?;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_anonymous_prompt_logged() {
        let store = Store::open_in_memory().unwrap();
        let log = store
            .log_prompt(&NewPrompt {
                user_id: None,
                command: "What is a hook turn?".into(),
                response: "A right turn made from the left lane.".into(),
            })
            .await
            .unwrap();
        assert!(!log.id.is_empty());

        let conn = store.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM prompts WHERE id = ?1", params![log.id], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_prompt_for_unknown_user_rejected() {
        let store = Store::open_in_memory().unwrap();
        let result = store
            .log_prompt(&NewPrompt {
                user_id: Some("ghost".into()),
                command: "hi".into(),
                response: "hello".into(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::UnknownReference("user"))));
    }
}
