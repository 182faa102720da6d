//! Delivery platform catalog and per-user platform links.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One third-party delivery platform in the catalog.
///
/// Catalog rows are seeded and rarely change; retiring a platform flips
/// `is_active` instead of deleting the row so existing links keep their
/// foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPlatform {
    /// Primary key.
    pub id: Uuid,
    /// Display name, e.g. "Amazon Flex".
    pub name: String,
    /// URL-safe identifier, unique across the catalog.
    pub slug: String,
    /// Mobile deep-link scheme, when the platform app supports one.
    pub deep_link_url: Option<String>,
    /// Web portal fallback.
    pub web_portal_url: Option<String>,
    /// Hint describing the platform's package identifier format.
    pub package_id_hint: Option<String>,
    /// Soft-deactivation flag.
    pub is_active: bool,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A worker's association with one delivery platform.
///
/// Unique per (user, platform); unlinking soft-deactivates so a re-link
/// reuses the row and its history.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformLink {
    /// Primary key.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Linked catalog row.
    pub platform_id: Uuid,
    /// Per-user display name override.
    pub display_name: Option<String>,
    /// Stamped by the launch endpoint.
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Soft-deactivation flag.
    pub is_active: bool,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A link joined with its catalog row, the shape list endpoints return.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformLinkView {
    /// The link row.
    #[serde(flatten)]
    pub link: PlatformLink,
    /// The linked platform.
    pub platform: DeliveryPlatform,
}

/// Seed catalog shipped with the service.
///
/// Operators load this once into an empty `delivery_platforms` table; the
/// application itself never mutates the catalog.
pub fn seed_platforms() -> Vec<SeedPlatform> {
    vec![
        SeedPlatform {
            name: "Amazon Flex",
            slug: "amazon-flex",
            deep_link_url: Some("flexapp://"),
            web_portal_url: Some("https://flex.amazon.com"),
            package_id_hint: Some("TBA followed by 12 digits"),
        },
        SeedPlatform {
            name: "DoorDash",
            slug: "doordash",
            deep_link_url: Some("doordash-dasher://"),
            web_portal_url: Some("https://dasher.doordash.com"),
            package_id_hint: None,
        },
        SeedPlatform {
            name: "Uber Eats",
            slug: "uber-eats",
            deep_link_url: Some("uberdriver://"),
            web_portal_url: Some("https://drivers.uber.com"),
            package_id_hint: None,
        },
        SeedPlatform {
            name: "Instacart",
            slug: "instacart",
            deep_link_url: Some("instacart-shopper://"),
            web_portal_url: Some("https://shoppers.instacart.com"),
            package_id_hint: None,
        },
        SeedPlatform {
            name: "Roadie",
            slug: "roadie",
            deep_link_url: None,
            web_portal_url: Some("https://www.roadie.com/drivers"),
            package_id_hint: Some("RDI- prefix"),
        },
    ]
}

/// Static seed row for [`seed_platforms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlatform {
    /// Display name.
    pub name: &'static str,
    /// URL-safe identifier.
    pub slug: &'static str,
    /// Mobile deep-link scheme.
    pub deep_link_url: Option<&'static str>,
    /// Web portal fallback.
    pub web_portal_url: Option<&'static str>,
    /// Package identifier format hint.
    pub package_id_hint: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    fn seed_slugs_are_unique_and_url_safe() {
        let seeds = seed_platforms();
        let slugs: HashSet<&str> = seeds.iter().map(|p| p.slug).collect();
        assert_eq!(slugs.len(), seeds.len());
        for slug in slugs {
            assert!(
                slug.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "slug {slug} is not url-safe"
            );
        }
    }

    #[rstest]
    fn every_seed_has_a_launch_target() {
        for seed in seed_platforms() {
            assert!(
                seed.deep_link_url.is_some() || seed.web_portal_url.is_some(),
                "{} has no way to launch",
                seed.name
            );
        }
    }
}
