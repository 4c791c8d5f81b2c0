use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates;

/// Granularity of the sales series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetrics {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub active_customers: u64,
    pub total_licenses: u64,
    pub revenue_growth: f64,
    pub profit_margin: f64,
}

/// One bucket of a sales series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesData {
    pub name: String,
    pub licenses: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSeries {
    #[serde(default)]
    pub daily: Vec<SalesData>,
    #[serde(default)]
    pub weekly: Vec<SalesData>,
    #[serde(default)]
    pub monthly: Vec<SalesData>,
}

impl SalesSeries {
    pub fn for_timeframe(&self, tf: TimeFrame) -> &[SalesData] {
        match tf {
            TimeFrame::Daily => &self.daily,
            TimeFrame::Weekly => &self.weekly,
            TimeFrame::Monthly => &self.monthly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseDistribution {
    pub name: String,
    pub value: u64,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub id: String,
    pub name: String,
    pub total_spent: f64,
    pub license_count: u64,
    #[serde(default, with = "dates::option_instant")]
    pub last_purchase: Option<DateTime<Utc>>,
}

/// Response of `GET /analytics/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    #[serde(default, rename = "kpiMetrics")]
    pub kpi: KpiMetrics,
    #[serde(default)]
    pub sales_data: SalesSeries,
    #[serde(default)]
    pub license_distribution: Vec<LicenseDistribution>,
    #[serde(default)]
    pub top_customers: Vec<TopCustomer>,
}
