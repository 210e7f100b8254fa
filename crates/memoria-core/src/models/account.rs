use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Overview counters shown on the landing section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(rename = "memorialCount", default)]
    pub memorial_count: u32,
    #[serde(rename = "upcomingEvents", default)]
    pub upcoming_events: u32,
    #[serde(rename = "openOrders", default)]
    pub open_orders: u32,
    #[serde(rename = "activeSubscriptions", default)]
    pub active_subscriptions: u32,
    #[serde(rename = "candlesLit", default)]
    pub candles_lit: u32,
}
