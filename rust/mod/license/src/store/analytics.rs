use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;
use tracing::debug;

use super::{Activity, StoreContext, StoreResult};
use crate::model::{AnalyticsData, LicenseDistribution, SalesData, TimeFrame, TopCustomer};

/// Latest admin dashboard figures.
pub struct AnalyticsStore {
    ctx: StoreContext,
    data: RwLock<Option<(TimeFrame, AnalyticsData)>>,
    activity: Activity,
}

impl AnalyticsStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            data: RwLock::new(None),
            activity: Activity::default(),
        }
    }

    /// Fetch dashboard figures. On failure the previous figures stay.
    pub async fn dashboard(&self, timeframe: TimeFrame) -> StoreResult<AnalyticsData> {
        let _busy = self.activity.begin();
        match self.ctx.api.analytics(timeframe).await {
            Ok(data) => {
                if self.ctx.is_live() {
                    debug!(%timeframe, "analytics refreshed");
                    *self.data.write().unwrap_or_else(PoisonError::into_inner) = Some((timeframe, data.clone()));
                }
                Ok(data)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch analytics")),
        }
    }

    pub async fn sales(&self, timeframe: TimeFrame) -> StoreResult<Vec<SalesData>> {
        let _busy = self.activity.begin();
        self.ctx
            .api
            .sales(timeframe)
            .await
            .map_err(|e| self.ctx.failure(e.into(), "Failed to fetch sales data"))
    }

    pub async fn license_distribution(&self) -> StoreResult<Vec<LicenseDistribution>> {
        let _busy = self.activity.begin();
        self.ctx
            .api
            .license_distribution()
            .await
            .map_err(|e| self.ctx.failure(e.into(), "Failed to fetch license distribution"))
    }

    pub async fn top_customers(&self, limit: usize) -> StoreResult<Vec<TopCustomer>> {
        let _busy = self.activity.begin();
        self.ctx
            .api
            .top_customers(limit)
            .await
            .map_err(|e| self.ctx.failure(e.into(), "Failed to fetch top customers"))
    }

    /// Monthly revenue for purchases dated `from..=to`.
    pub async fn revenue(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<SalesData>> {
        let _busy = self.activity.begin();
        match self.ctx.api.revenue(from, to).await {
            Ok(report) => {
                debug!(%from, %to, months = report.len(), "revenue report fetched");
                Ok(report)
            }
            Err(e) => Err(self.ctx.failure(e.into(), "Failed to fetch revenue report")),
        }
    }

    pub fn current(&self) -> Option<(TimeFrame, AnalyticsData)> {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.activity.is_busy()
    }
}
