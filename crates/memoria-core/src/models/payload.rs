use serde::{Deserialize, Serialize};

use super::{DashboardSummary, Memorial, MemorialEvent, Order, Product, Profile, Subscription};
use crate::section::ResourceKey;

/// A successfully fetched payload for one resource key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionData {
    Summary(DashboardSummary),
    Memorials(Vec<Memorial>),
    Events(Vec<MemorialEvent>),
    Products(Vec<Product>),
    Orders(Vec<Order>),
    Subscriptions(Vec<Subscription>),
    Profile(Profile),
}

impl SectionData {
    /// Parse a 2xx response body into the payload type for `key`.
    pub fn decode(key: ResourceKey, body: &str) -> serde_json::Result<Self> {
        Ok(match key {
            ResourceKey::Summary => SectionData::Summary(serde_json::from_str(body)?),
            ResourceKey::Memorials => SectionData::Memorials(serde_json::from_str(body)?),
            ResourceKey::Events => SectionData::Events(serde_json::from_str(body)?),
            ResourceKey::Products => SectionData::Products(serde_json::from_str(body)?),
            ResourceKey::Orders => SectionData::Orders(serde_json::from_str(body)?),
            ResourceKey::Subscriptions => SectionData::Subscriptions(serde_json::from_str(body)?),
            ResourceKey::Profile => SectionData::Profile(serde_json::from_str(body)?),
        })
    }

    pub fn key(&self) -> ResourceKey {
        match self {
            SectionData::Summary(_) => ResourceKey::Summary,
            SectionData::Memorials(_) => ResourceKey::Memorials,
            SectionData::Events(_) => ResourceKey::Events,
            SectionData::Products(_) => ResourceKey::Products,
            SectionData::Orders(_) => ResourceKey::Orders,
            SectionData::Subscriptions(_) => ResourceKey::Subscriptions,
            SectionData::Profile(_) => ResourceKey::Profile,
        }
    }

    /// Number of list items, or `None` for single-object payloads.
    pub fn item_count(&self) -> Option<usize> {
        match self {
            SectionData::Memorials(v) => Some(v.len()),
            SectionData::Events(v) => Some(v.len()),
            SectionData::Products(v) => Some(v.len()),
            SectionData::Orders(v) => Some(v.len()),
            SectionData::Subscriptions(v) => Some(v.len()),
            SectionData::Summary(_) | SectionData::Profile(_) => None,
        }
    }
}
