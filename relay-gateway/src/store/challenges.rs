use super::store_err;
use super::SessionStore;
use relay_core::now_unix;
use relay_core::Error;
use relay_core::SessionState;
use relay_core::SigningChallenge;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl SessionStore {
    /// Persist a challenge and move its session `initiated ->
    /// challenge_sent`, atomically.
    pub async fn create_challenge(&self, challenge: &SigningChallenge) -> Result<bool, Error> {
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        sqlx::query(
            "INSERT INTO challenges \
             (challenge_id, session_id, payload, payload_ref, context, expires_at, is_used, signature) \
             VALUES (?, ?, ?, ?, ?, ?, 0, NULL)",
        )
        .bind(&challenge.challenge_id)
        .bind(&challenge.session_id)
        .bind(&challenge.payload)
        .bind(&challenge.payload_ref)
        .bind(&challenge.context)
        .bind(challenge.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let updated = sqlx::query(
            "UPDATE sessions SET challenge_id = ?, state = ?, updated_at = ? \
             WHERE session_id = ? AND state = ?",
        )
        .bind(&challenge.challenge_id)
        .bind(SessionState::ChallengeSent.as_str())
        .bind(now_unix())
        .bind(&challenge.session_id)
        .bind(SessionState::Initiated.as_str())
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if updated.rows_affected() != 1 {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    pub async fn get_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<Option<SigningChallenge>, Error> {
        let row = sqlx::query("SELECT * FROM challenges WHERE challenge_id = ?")
            .bind(challenge_id)
            .fetch_optional(self.pool())
            .await
            .map_err(store_err)?;

        row.map(|r| row_to_challenge(&r)).transpose()
    }

    /// Atomic check-and-set on `is_used`, recording the winning signature.
    ///
    /// Returns `(true, challenge)` for the single caller that flipped the
    /// flag, `(false, challenge)` for every later caller, and `(false,
    /// None)` for an unknown id. The expiry guard makes a just-expired
    /// challenge lose even if the caller's clock check raced the deadline.
    pub async fn mark_challenge_used(
        &self,
        challenge_id: &str,
        signature: &str,
        now: i64,
    ) -> Result<(bool, Option<SigningChallenge>), Error> {
        let updated = sqlx::query(
            "UPDATE challenges SET is_used = 1, signature = ? \
             WHERE challenge_id = ? AND is_used = 0 AND expires_at > ?",
        )
        .bind(signature)
        .bind(challenge_id)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(store_err)?;

        let challenge = self.get_challenge(challenge_id).await?;
        Ok((updated.rows_affected() == 1, challenge))
    }

    /// Drop expired, never-used challenges whose session already reached a
    /// terminal state. Sessions themselves are archived, not deleted.
    pub async fn delete_expired_challenges(&self, now: i64) -> Result<u64, Error> {
        let result = sqlx::query(
            "DELETE FROM challenges \
             WHERE is_used = 0 AND expires_at < ? \
               AND session_id IN \
                   (SELECT session_id FROM sessions \
                    WHERE state IN ('completed', 'failed', 'expired'))",
        )
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected())
    }
}

fn row_to_challenge(row: &SqliteRow) -> Result<SigningChallenge, Error> {
    let is_used: i64 = row.try_get("is_used").map_err(store_err)?;

    Ok(SigningChallenge {
        challenge_id: row.try_get("challenge_id").map_err(store_err)?,
        session_id: row.try_get("session_id").map_err(store_err)?,
        payload: row.try_get("payload").map_err(store_err)?,
        payload_ref: row.try_get("payload_ref").map_err(store_err)?,
        context: row.try_get("context").map_err(store_err)?,
        expires_at: row.try_get("expires_at").map_err(store_err)?,
        is_used: is_used != 0,
        signature: row.try_get("signature").map_err(store_err)?,
    })
}
