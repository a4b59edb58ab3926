//! Inventory policy on top of the store's VTXO primitives.
//!
//! Selection prefers an exact match, then the fewest outputs, then the
//! oldest inventory; a shortfall triggers one refill round against arkd
//! before giving up with `insufficient_inventory`.

use crate::backends::ArkService;
use crate::store::SessionStore;
use relay_core::now_unix;
use relay_core::vtxo::select_vtxos;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::Vtxo;
use std::sync::Arc;

pub struct Inventory<A: ArkService> {
    store: SessionStore,
    ark: Arc<A>,
    /// Smallest denomination requested when refilling.
    min_vtxo_amount: u64,
}

impl<A: ArkService> Inventory<A> {
    pub fn new(store: SessionStore, ark: Arc<A>, min_vtxo_amount: u64) -> Self {
        Self {
            store,
            ark,
            min_vtxo_amount,
        }
    }

    /// Reserve VTXOs covering `amount` for a session.
    ///
    /// Returns the reserved set. The reservation and the user's reserved
    /// balance move in one store transaction; losing a selection race
    /// retries once against fresh inventory.
    pub async fn reserve(
        &self,
        user_pubkey: &str,
        asset_id: &str,
        amount: u64,
        session_id: &str,
    ) -> Result<Vec<Vtxo>, Error> {
        match self
            .try_reserve(user_pubkey, asset_id, amount, session_id)
            .await
        {
            Ok(reserved) => Ok(reserved),
            Err(e) if e.kind() == ErrorKind::InsufficientInventory => {
                self.refill(asset_id, amount).await?;
                self.try_reserve(user_pubkey, asset_id, amount, session_id)
                    .await
            }
            Err(e) if e.kind() == ErrorKind::ReservationLost => {
                // Someone grabbed part of the selection; one more look.
                self.try_reserve(user_pubkey, asset_id, amount, session_id)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn try_reserve(
        &self,
        user_pubkey: &str,
        asset_id: &str,
        amount: u64,
        session_id: &str,
    ) -> Result<Vec<Vtxo>, Error> {
        let now = now_unix();
        let available = self.store.list_available_vtxos(asset_id, now).await?;

        let selection = select_vtxos(&available, amount).ok_or_else(|| {
            let total: u64 = available.iter().map(|v| v.amount).sum();
            Error::new(
                ErrorKind::InsufficientInventory,
                format!("have {total} of {amount} {asset_id} available"),
            )
        })?;

        let vtxo_ids: Vec<String> = selection.iter().map(|v| v.vtxo_id.clone()).collect();
        let total = self
            .store
            .reserve_selected(session_id, user_pubkey, asset_id, &vtxo_ids)
            .await?;

        tracing::debug!(
            session_id,
            asset_id,
            amount,
            total,
            outputs = vtxo_ids.len(),
            "Reserved inventory"
        );

        Ok(selection)
    }

    /// Ask arkd for fresh outputs covering the shortfall.
    async fn refill(&self, asset_id: &str, amount: u64) -> Result<(), Error> {
        let denomination = amount.max(self.min_vtxo_amount);
        let count = 2;

        tracing::info!(asset_id, denomination, count, "Refilling VTXO inventory");

        let created = self.ark.create_vtxos(asset_id, denomination, count).await?;
        if created.is_empty() {
            return Err(Error::new(
                ErrorKind::InsufficientInventory,
                format!("arkd returned no new VTXOs for {asset_id}"),
            ));
        }

        self.store.insert_vtxos(&created).await?;
        Ok(())
    }

    /// Return a session's reservations to the pool.
    pub async fn release(&self, session_id: &str) -> Result<u64, Error> {
        self.store.release_reservation(session_id).await
    }
}
