use super::store_err;
use super::SessionStore;
use relay_core::Error;
use relay_core::InvoiceStatus;
use relay_core::InvoiceType;
use relay_core::LightningInvoice;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl SessionStore {
    pub async fn create_invoice(&self, invoice: &LightningInvoice) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO invoices \
             (payment_hash, bolt11, session_id, amount_sats, asset_id, status, invoice_type, \
              created_at, expires_at, paid_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
        )
        .bind(&invoice.payment_hash)
        .bind(&invoice.bolt11)
        .bind(&invoice.session_id)
        .bind(invoice.amount_sats as i64)
        .bind(&invoice.asset_id)
        .bind(invoice.status.as_str())
        .bind(invoice.invoice_type.as_str())
        .bind(invoice.created_at)
        .bind(invoice.expires_at)
        .execute(self.pool())
        .await
        .map_err(store_err)?;

        Ok(())
    }

    pub async fn get_invoice(
        &self,
        payment_hash: &str,
    ) -> Result<Option<LightningInvoice>, Error> {
        let row = sqlx::query("SELECT * FROM invoices WHERE payment_hash = ?")
            .bind(payment_hash)
            .fetch_optional(self.pool())
            .await
            .map_err(store_err)?;

        row.map(|r| row_to_invoice(&r)).transpose()
    }

    /// Move an invoice out of a live status. Terminal invoices stay put, so
    /// a re-delivered settlement event is a no-op.
    pub async fn update_invoice_status(
        &self,
        payment_hash: &str,
        status: InvoiceStatus,
        paid_at: Option<i64>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE invoices SET status = ?, paid_at = COALESCE(?, paid_at) \
             WHERE payment_hash = ? AND status IN ('pending', 'pending_payment')",
        )
        .bind(status.as_str())
        .bind(paid_at)
        .bind(payment_hash)
        .execute(self.pool())
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_pending_invoices(&self) -> Result<Vec<LightningInvoice>, Error> {
        let rows = sqlx::query(
            "SELECT * FROM invoices WHERE status IN ('pending', 'pending_payment')",
        )
        .fetch_all(self.pool())
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_invoice).collect()
    }

    /// Live invoices past their deadline, for the sweeper.
    pub async fn list_expired_invoices(&self, now: i64) -> Result<Vec<LightningInvoice>, Error> {
        let rows = sqlx::query(
            "SELECT * FROM invoices \
             WHERE status IN ('pending', 'pending_payment') AND expires_at < ?",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_invoice).collect()
    }
}

fn row_to_invoice(row: &SqliteRow) -> Result<LightningInvoice, Error> {
    let status_raw: String = row.try_get("status").map_err(store_err)?;
    let status = InvoiceStatus::parse(&status_raw)
        .ok_or_else(|| Error::ad_hoc(format!("corrupt invoice status: {status_raw}")))?;

    let type_raw: String = row.try_get("invoice_type").map_err(store_err)?;
    let invoice_type = InvoiceType::parse(&type_raw)
        .ok_or_else(|| Error::ad_hoc(format!("corrupt invoice type: {type_raw}")))?;

    Ok(LightningInvoice {
        payment_hash: row.try_get("payment_hash").map_err(store_err)?,
        bolt11: row.try_get("bolt11").map_err(store_err)?,
        session_id: row.try_get("session_id").map_err(store_err)?,
        amount_sats: row.try_get::<i64, _>("amount_sats").map_err(store_err)? as u64,
        asset_id: row.try_get("asset_id").map_err(store_err)?,
        status,
        invoice_type,
        created_at: row.try_get("created_at").map_err(store_err)?,
        expires_at: row.try_get("expires_at").map_err(store_err)?,
        paid_at: row.try_get("paid_at").map_err(store_err)?,
    })
}
