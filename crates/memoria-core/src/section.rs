//! Dashboard sections and the resource keys that back them.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TTL for data that changes as the user acts in the same session.
pub const VOLATILE_TTL: Duration = Duration::from_secs(30);

/// TTL for slow-changing data (catalog, profile).
pub const SLOW_TTL: Duration = Duration::from_secs(60);

/// Top-level navigable views of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Dashboard,
    Memorials,
    Events,
    Store,
    Orders,
    Subscriptions,
    Profile,
}

impl Section {
    /// All sections in tab order.
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Memorials,
        Section::Events,
        Section::Store,
        Section::Orders,
        Section::Subscriptions,
        Section::Profile,
    ];

    /// Get the display title for this section.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Memorials => "Memorials",
            Section::Events => "Events",
            Section::Store => "Store",
            Section::Orders => "Orders",
            Section::Subscriptions => "Subscriptions",
            Section::Profile => "Profile",
        }
    }

    /// Section for a 1-based hotkey number.
    pub fn from_index(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// 1-based position in tab order.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }

    /// Get the next section (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Section::Dashboard => Section::Memorials,
            Section::Memorials => Section::Events,
            Section::Events => Section::Store,
            Section::Store => Section::Orders,
            Section::Orders => Section::Subscriptions,
            Section::Subscriptions => Section::Profile,
            Section::Profile => Section::Dashboard,
        }
    }

    /// Get the previous section (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Section::Dashboard => Section::Profile,
            Section::Memorials => Section::Dashboard,
            Section::Events => Section::Memorials,
            Section::Store => Section::Events,
            Section::Orders => Section::Store,
            Section::Subscriptions => Section::Orders,
            Section::Profile => Section::Subscriptions,
        }
    }

    /// The resource whose data this section displays.
    pub fn resource_key(&self) -> ResourceKey {
        match self {
            Section::Dashboard => ResourceKey::Summary,
            Section::Memorials => ResourceKey::Memorials,
            Section::Events => ResourceKey::Events,
            Section::Store => ResourceKey::Products,
            Section::Orders => ResourceKey::Orders,
            Section::Subscriptions => ResourceKey::Subscriptions,
            Section::Profile => ResourceKey::Profile,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Identifier of a cached resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKey {
    Summary,
    Memorials,
    Events,
    Products,
    Orders,
    Subscriptions,
    Profile,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 7] = [
        ResourceKey::Summary,
        ResourceKey::Memorials,
        ResourceKey::Events,
        ResourceKey::Products,
        ResourceKey::Orders,
        ResourceKey::Subscriptions,
        ResourceKey::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::Summary => "summary",
            ResourceKey::Memorials => "memorials",
            ResourceKey::Events => "events",
            ResourceKey::Products => "products",
            ResourceKey::Orders => "orders",
            ResourceKey::Subscriptions => "subscriptions",
            ResourceKey::Profile => "profile",
        }
    }

    /// REST endpoint, relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKey::Summary => "/api/dashboard/summary",
            ResourceKey::Memorials => "/api/memorials/mine",
            ResourceKey::Events => "/api/events/mine",
            ResourceKey::Products => "/api/products",
            ResourceKey::Orders => "/api/orders/mine",
            ResourceKey::Subscriptions => "/api/subscriptions/mine",
            ResourceKey::Profile => "/api/users/me",
        }
    }

    /// Default freshness window for this resource.
    pub fn default_ttl(&self) -> Duration {
        match self {
            ResourceKey::Products | ResourceKey::Profile => SLOW_TTL,
            _ => VOLATILE_TTL,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
