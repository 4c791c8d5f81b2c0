use tracing::{debug, info};

use super::{Activity, Cache, StoreContext, StoreResult};
use crate::model::{CreateLicense, License, UpdateLicense};

/// Cached license catalog.
pub struct LicenseStore {
    ctx: StoreContext,
    cache: Cache<License>,
    activity: Activity,
}

impl LicenseStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            cache: Cache::new(),
            activity: Activity::default(),
        }
    }

    pub async fn list(&self) -> StoreResult<Vec<License>> {
        let _busy = self.activity.begin();
        match self.ctx.api.list_licenses().await {
            Ok(licenses) => {
                if self.ctx.is_live() {
                    debug!(count = licenses.len(), "license catalog replaced");
                    self.cache.replace_all(licenses.clone());
                }
                Ok(licenses)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch licenses")),
        }
    }

    pub async fn get(&self, id: &str) -> StoreResult<License> {
        let _busy = self.activity.begin();
        match self.ctx.api.get_license(id).await {
            Ok(license) => Ok(self.keep(license)),
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch license")),
        }
    }

    pub async fn create(&self, license: &CreateLicense) -> StoreResult<License> {
        let _busy = self.activity.begin();
        match self.ctx.api.create_license(license).await {
            Ok(created) => {
                info!(id = %created.id, kind = %created.category, subtype = %created.subtype, "license created");
                let created = self.keep(created);
                self.ctx.success("License created successfully");
                Ok(created)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to create license")),
        }
    }

    pub async fn update(&self, id: &str, patch: &UpdateLicense) -> StoreResult<License> {
        let _busy = self.activity.begin();
        match self.ctx.api.update_license(id, patch).await {
            Ok(updated) => {
                info!(id, "license updated");
                let updated = self.keep(updated);
                self.ctx.success("License updated successfully");
                Ok(updated)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to update license")),
        }
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let _busy = self.activity.begin();
        match self.ctx.api.delete_license(id).await {
            Ok(()) => {
                info!(id, "license deleted");
                if self.ctx.is_live() {
                    self.cache.remove(id);
                }
                self.ctx.success("License deleted successfully");
                Ok(())
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to delete license")),
        }
    }

    fn keep(&self, license: License) -> License {
        if self.ctx.is_live() {
            self.cache.upsert(license.clone());
        }
        license
    }

    pub fn snapshot(&self) -> Vec<License> {
        self.cache.snapshot()
    }

    pub fn cached(&self, id: &str) -> Option<License> {
        self.cache.get(id)
    }

    pub fn is_loading(&self) -> bool {
        self.activity.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, Harness};
    use crate::model::LicenseCategory;

    #[tokio::test]
    async fn crud_round_through_cache() {
        let h = Harness::new();
        let store = LicenseStore::new(h.ctx());

        let created = store
            .create(&CreateLicense {
                category: LicenseCategory::Sophos,
                subtype: "XG Firewall".into(),
                cost: 100.0,
                price: 150.0,
                active: true,
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(store.snapshot(), vec![created.clone()]);

        let patch = UpdateLicense { price: Some(180.0), ..Default::default() };
        let updated = store.update(&created.id, &patch).await.unwrap();
        assert_eq!(updated.price, 180.0);
        assert_eq!(store.cached(&created.id).unwrap().margin(), 80.0 / 180.0 * 100.0);

        store.delete(&created.id).await.unwrap();
        assert!(store.snapshot().is_empty());

        let messages: Vec<_> = h.notifications.active().into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            [
                "License created successfully",
                "License updated successfully",
                "License deleted successfully"
            ]
        );
    }

    #[tokio::test]
    async fn get_failure_keeps_cached_record() {
        let h = Harness::new();
        h.api.seed_license(fixtures::catalog("l1", "E3", 20.0, 32.0));
        let store = LicenseStore::new(h.ctx());
        store.list().await.unwrap();

        h.api.set_offline(true);
        assert!(store.get("l1").await.is_err());
        assert_eq!(store.cached("l1").unwrap().price, 32.0);
    }
}
