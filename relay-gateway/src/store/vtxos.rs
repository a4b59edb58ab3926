use super::result_json;
use super::store_err;
use super::SessionStore;
use relay_core::now_unix;
use relay_core::AssetBalance;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::Intent;
use relay_core::SessionResult;
use relay_core::SessionState;
use relay_core::Vtxo;
use relay_core::VtxoStatus;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::Sqlite;
use sqlx::Transaction;

impl SessionStore {
    // --- VTXO primitives ---

    pub async fn insert_vtxos(&self, vtxos: &[Vtxo]) -> Result<(), Error> {
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        for vtxo in vtxos {
            sqlx::query(
                "INSERT INTO vtxos \
                 (vtxo_id, asset_id, amount, owner_pubkey, status, reserved_by_session, \
                  created_at, expires_at) \
                 VALUES (?, ?, ?, ?, ?, NULL, ?, ?)",
            )
            .bind(&vtxo.vtxo_id)
            .bind(&vtxo.asset_id)
            .bind(vtxo.amount as i64)
            .bind(&vtxo.owner_pubkey)
            .bind(vtxo.status.as_str())
            .bind(vtxo.created_at)
            .bind(vtxo.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    /// Unexpired available VTXOs for an asset, smallest then oldest first.
    pub async fn list_available_vtxos(
        &self,
        asset_id: &str,
        now: i64,
    ) -> Result<Vec<Vtxo>, Error> {
        let rows = sqlx::query(
            "SELECT * FROM vtxos \
             WHERE asset_id = ? AND status = 'available' AND expires_at > ? \
             ORDER BY amount ASC, created_at ASC",
        )
        .bind(asset_id)
        .bind(now)
        .fetch_all(self.pool())
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_vtxo).collect()
    }

    /// Reserve a specific selection of VTXOs for a session and lift the
    /// user's reserved balance by their total, in one transaction.
    ///
    /// Any VTXO that is no longer available fails the whole reservation
    /// with `reservation_lost`; an over-committed balance fails it with
    /// `insufficient_balance`. Either way nothing is written.
    pub async fn reserve_selected(
        &self,
        session_id: &str,
        user_pubkey: &str,
        asset_id: &str,
        vtxo_ids: &[String],
    ) -> Result<u64, Error> {
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        let mut total: i64 = 0;
        for vtxo_id in vtxo_ids {
            let amount: Option<i64> = sqlx::query_scalar(
                "UPDATE vtxos SET status = 'reserved', reserved_by_session = ? \
                 WHERE vtxo_id = ? AND status = 'available' \
                 RETURNING amount",
            )
            .bind(session_id)
            .bind(vtxo_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?;

            match amount {
                Some(amount) => total += amount,
                None => {
                    tx.rollback().await.map_err(store_err)?;
                    return Err(Error::new(
                        ErrorKind::ReservationLost,
                        format!("vtxo {vtxo_id} is no longer available"),
                    ));
                }
            }
        }

        if let Err(e) = reserve_balance_in_tx(&mut tx, user_pubkey, asset_id, total).await {
            tx.rollback().await.map_err(store_err)?;
            return Err(e);
        }

        tx.commit().await.map_err(store_err)?;
        Ok(total as u64)
    }

    /// The plain reservation primitive: pick available VTXOs smallest-first
    /// until `amount` is covered. Selection inside the transaction keeps the
    /// choice deterministic under concurrency.
    pub async fn reserve_vtxos(
        &self,
        user_pubkey: &str,
        asset_id: &str,
        amount: u64,
        session_id: &str,
    ) -> Result<Vec<Vtxo>, Error> {
        let mut tx = self.pool().begin().await.map_err(store_err)?;
        let now = now_unix();

        let rows = sqlx::query(
            "SELECT * FROM vtxos \
             WHERE asset_id = ? AND status = 'available' AND expires_at > ? \
             ORDER BY amount ASC, created_at ASC",
        )
        .bind(asset_id)
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err)?;

        let candidates = rows
            .iter()
            .map(row_to_vtxo)
            .collect::<Result<Vec<_>, _>>()?;

        let mut picked = Vec::new();
        let mut covered: u64 = 0;
        for vtxo in candidates {
            if covered >= amount {
                break;
            }
            covered += vtxo.amount;
            picked.push(vtxo);
        }

        if covered < amount {
            tx.rollback().await.map_err(store_err)?;
            return Err(Error::new(
                ErrorKind::InsufficientInventory,
                format!("have {covered} of {amount} {asset_id} available"),
            ));
        }

        for vtxo in &mut picked {
            sqlx::query(
                "UPDATE vtxos SET status = 'reserved', reserved_by_session = ? \
                 WHERE vtxo_id = ?",
            )
            .bind(session_id)
            .bind(&vtxo.vtxo_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

            vtxo.status = VtxoStatus::Reserved;
            vtxo.reserved_by_session = Some(session_id.to_string());
        }

        if let Err(e) = reserve_balance_in_tx(&mut tx, user_pubkey, asset_id, covered as i64).await
        {
            tx.rollback().await.map_err(store_err)?;
            return Err(e);
        }

        tx.commit().await.map_err(store_err)?;
        Ok(picked)
    }

    /// Return a session's reservations to the pool and drop the reserved
    /// balance they held. Safe to call when nothing is reserved.
    pub async fn release_reservation(&self, session_id: &str) -> Result<u64, Error> {
        let mut tx = self.pool().begin().await.map_err(store_err)?;
        let released = release_reservation_in_tx(&mut tx, session_id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(released)
    }

    /// Available VTXOs past their deadline leave the selection pool.
    pub async fn expire_available_vtxos(&self, now: i64) -> Result<u64, Error> {
        let result = sqlx::query(
            "UPDATE vtxos SET status = 'expired' \
             WHERE status = 'available' AND expires_at < ?",
        )
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected())
    }

    pub async fn list_vtxos_for_session(&self, session_id: &str) -> Result<Vec<Vtxo>, Error> {
        let rows = sqlx::query("SELECT * FROM vtxos WHERE reserved_by_session = ?")
            .bind(session_id)
            .fetch_all(self.pool())
            .await
            .map_err(store_err)?;

        rows.iter().map(row_to_vtxo).collect()
    }

    // --- Balances ---

    pub async fn get_balance(
        &self,
        user_pubkey: &str,
        asset_id: &str,
    ) -> Result<AssetBalance, Error> {
        let row = sqlx::query(
            "SELECT balance, reserved FROM asset_balances \
             WHERE user_pubkey = ? AND asset_id = ?",
        )
        .bind(user_pubkey)
        .bind(asset_id)
        .fetch_optional(self.pool())
        .await
        .map_err(store_err)?;

        let (balance, reserved) = match row {
            Some(row) => (
                row.try_get::<i64, _>("balance").map_err(store_err)? as u64,
                row.try_get::<i64, _>("reserved").map_err(store_err)? as u64,
            ),
            None => (0, 0),
        };

        Ok(AssetBalance {
            user_pubkey: user_pubkey.to_string(),
            asset_id: asset_id.to_string(),
            balance,
            reserved,
        })
    }

    /// Apply signed deltas to a balance row, creating it on first touch.
    /// The schema's check constraints reject any result where `reserved`
    /// would exceed `balance` or either would go negative.
    pub async fn adjust_balance(
        &self,
        user_pubkey: &str,
        asset_id: &str,
        delta_balance: i64,
        delta_reserved: i64,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO asset_balances (user_pubkey, asset_id, balance, reserved) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_pubkey, asset_id) DO UPDATE \
             SET balance = balance + excluded.balance, \
                 reserved = reserved + excluded.reserved",
        )
        .bind(user_pubkey)
        .bind(asset_id)
        .bind(delta_balance)
        .bind(delta_reserved)
        .execute(self.pool())
        .await
        .map_err(store_err)?;

        Ok(())
    }

    // --- Compound session transitions ---

    /// Fail a live session: record the error, release its reservations.
    /// Returns `false` when the session was already terminal.
    pub async fn fail_session(
        &self,
        session_id: &str,
        code: ErrorKind,
        message: &str,
    ) -> Result<bool, Error> {
        let result = SessionResult::Failure {
            code,
            message: message.to_string(),
        };
        self.terminate_session(session_id, SessionState::Failed, &result)
            .await
    }

    /// Expire a live session, releasing its reservations.
    pub async fn expire_session(&self, session_id: &str) -> Result<bool, Error> {
        let result = SessionResult::Failure {
            code: ErrorKind::ExpiredIntent,
            message: "session expired before completion".to_string(),
        };
        self.terminate_session(session_id, SessionState::Expired, &result)
            .await
    }

    async fn terminate_session(
        &self,
        session_id: &str,
        state: SessionState,
        result: &SessionResult,
    ) -> Result<bool, Error> {
        let result = result_json(result)?;
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        let updated = sqlx::query(
            "UPDATE sessions SET state = ?, result = ?, updated_at = ? \
             WHERE session_id = ? AND state NOT IN ('completed', 'failed', 'expired')",
        )
        .bind(state.as_str())
        .bind(&result)
        .bind(now_unix())
        .bind(session_id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if updated.rows_affected() != 1 {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        release_reservation_in_tx(&mut tx, session_id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    /// Finalize a committed transfer: session `committing -> completed`,
    /// reserved VTXOs spent, sender debited, recipient credited. One
    /// transaction; `false` means the state guard lost.
    pub async fn commit_transfer(
        &self,
        session_id: &str,
        user_pubkey: &str,
        recipient_pubkey: &str,
        asset_id: &str,
        amount: u64,
        result: &SessionResult,
    ) -> Result<bool, Error> {
        let result = result_json(result)?;
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        if !complete_session_in_tx(&mut tx, session_id, &result).await? {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        let spent_total = spend_reserved_in_tx(&mut tx, session_id).await?;

        debit_in_tx(&mut tx, user_pubkey, asset_id, amount as i64, spent_total).await?;

        sqlx::query(
            "INSERT INTO asset_balances (user_pubkey, asset_id, balance, reserved) \
             VALUES (?, ?, ?, 0) \
             ON CONFLICT (user_pubkey, asset_id) DO UPDATE \
             SET balance = balance + excluded.balance",
        )
        .bind(recipient_pubkey)
        .bind(asset_id)
        .bind(amount as i64)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    /// Finalize a land: session completed, reserved VTXOs spent, user
    /// debited. Debit happens only here, on payment COMPLETE.
    pub async fn commit_land(
        &self,
        session_id: &str,
        user_pubkey: &str,
        asset_id: &str,
        amount: u64,
        result: &SessionResult,
    ) -> Result<bool, Error> {
        let result = result_json(result)?;
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        if !complete_session_in_tx(&mut tx, session_id, &result).await? {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        let spent_total = spend_reserved_in_tx(&mut tx, session_id).await?;
        debit_in_tx(&mut tx, user_pubkey, asset_id, amount as i64, spent_total).await?;

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    /// Finalize a lift: session completed and the user credited with the
    /// minted amount.
    pub async fn commit_lift(
        &self,
        session_id: &str,
        user_pubkey: &str,
        asset_id: &str,
        amount: u64,
        result: &SessionResult,
    ) -> Result<bool, Error> {
        let result = result_json(result)?;
        let mut tx = self.pool().begin().await.map_err(store_err)?;

        if !complete_session_in_tx(&mut tx, session_id, &result).await? {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO asset_balances (user_pubkey, asset_id, balance, reserved) \
             VALUES (?, ?, ?, 0) \
             ON CONFLICT (user_pubkey, asset_id) DO UPDATE \
             SET balance = balance + excluded.balance",
        )
        .bind(user_pubkey)
        .bind(asset_id)
        .bind(amount as i64)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }
}

async fn reserve_balance_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user_pubkey: &str,
    asset_id: &str,
    total: i64,
) -> Result<(), Error> {
    let result = sqlx::query(
        "UPDATE asset_balances SET reserved = reserved + ? \
         WHERE user_pubkey = ? AND asset_id = ?",
    )
    .bind(total)
    .bind(user_pubkey)
    .bind(asset_id)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(updated) if updated.rows_affected() == 1 => Ok(()),
        Ok(_) => Err(Error::new(
            ErrorKind::InsufficientBalance,
            format!("no {asset_id} balance for {user_pubkey}"),
        )),
        Err(e) => {
            let mapped = store_err(e);
            if mapped.kind() == ErrorKind::StoreConflict {
                Err(Error::new(
                    ErrorKind::InsufficientBalance,
                    format!("reserving {total} {asset_id} exceeds balance"),
                ))
            } else {
                Err(mapped)
            }
        }
    }
}

async fn release_reservation_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: &str,
) -> Result<u64, Error> {
    let total: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(amount) FROM vtxos WHERE reserved_by_session = ?",
    )
    .bind(session_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(store_err)?;

    let Some(total) = total else {
        return Ok(0);
    };

    let now = now_unix();
    sqlx::query(
        "UPDATE vtxos SET status = 'expired', reserved_by_session = NULL \
         WHERE reserved_by_session = ? AND expires_at < ?",
    )
    .bind(session_id)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;

    sqlx::query(
        "UPDATE vtxos SET status = 'available', reserved_by_session = NULL \
         WHERE reserved_by_session = ?",
    )
    .bind(session_id)
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;

    // The session row knows whose reservation this was.
    let row = sqlx::query("SELECT user_pubkey, intent FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(store_err)?;

    if let Some(row) = row {
        let user_pubkey: String = row.try_get("user_pubkey").map_err(store_err)?;
        let intent_json: String = row.try_get("intent").map_err(store_err)?;
        let intent: Intent = serde_json::from_str(&intent_json)
            .map_err(|e| Error::ad_hoc(format!("corrupt intent column: {e}")))?;

        sqlx::query(
            "UPDATE asset_balances SET reserved = MAX(reserved - ?, 0) \
             WHERE user_pubkey = ? AND asset_id = ?",
        )
        .bind(total)
        .bind(&user_pubkey)
        .bind(intent.params.asset_id())
        .execute(&mut **tx)
        .await
        .map_err(store_err)?;
    }

    Ok(total as u64)
}

async fn complete_session_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: &str,
    result_json: &str,
) -> Result<bool, Error> {
    let updated = sqlx::query(
        "UPDATE sessions SET state = 'completed', result = ?, updated_at = ? \
         WHERE session_id = ? AND state = 'committing'",
    )
    .bind(result_json)
    .bind(now_unix())
    .bind(session_id)
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;

    Ok(updated.rows_affected() == 1)
}

async fn spend_reserved_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: &str,
) -> Result<i64, Error> {
    let total: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(amount) FROM vtxos WHERE reserved_by_session = ?",
    )
    .bind(session_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(store_err)?;

    sqlx::query(
        "UPDATE vtxos SET status = 'spent', reserved_by_session = NULL \
         WHERE reserved_by_session = ?",
    )
    .bind(session_id)
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;

    Ok(total.unwrap_or(0))
}

async fn debit_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user_pubkey: &str,
    asset_id: &str,
    amount: i64,
    reserved_total: i64,
) -> Result<(), Error> {
    sqlx::query(
        "UPDATE asset_balances \
         SET balance = balance - ?, reserved = MAX(reserved - ?, 0) \
         WHERE user_pubkey = ? AND asset_id = ?",
    )
    .bind(amount)
    .bind(reserved_total)
    .bind(user_pubkey)
    .bind(asset_id)
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;

    Ok(())
}

fn row_to_vtxo(row: &SqliteRow) -> Result<Vtxo, Error> {
    let status_raw: String = row.try_get("status").map_err(store_err)?;
    let status = VtxoStatus::parse(&status_raw)
        .ok_or_else(|| Error::ad_hoc(format!("corrupt vtxo status: {status_raw}")))?;

    Ok(Vtxo {
        vtxo_id: row.try_get("vtxo_id").map_err(store_err)?,
        asset_id: row.try_get("asset_id").map_err(store_err)?,
        amount: row.try_get::<i64, _>("amount").map_err(store_err)? as u64,
        owner_pubkey: row.try_get("owner_pubkey").map_err(store_err)?,
        status,
        reserved_by_session: row.try_get("reserved_by_session").map_err(store_err)?,
        created_at: row.try_get("created_at").map_err(store_err)?,
        expires_at: row.try_get("expires_at").map_err(store_err)?,
    })
}
