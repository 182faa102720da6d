//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly; the
//! migrations themselves live with the database deployment, not in this
//! repository. Audit timestamps (`created_at`, `updated_at`, `joined_at`)
//! default to `now()` in the database, and primary keys are UUIDs
//! supplied by the application.
//!
//! Status and role columns store the SCREAMING_SNAKE string forms of the
//! domain enums.

diesel::table! {
    /// Worker accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Lower-cased email, unique.
        email -> Varchar,
        /// bcrypt hash of the password.
        password_hash -> Varchar,
        /// Human-readable display name.
        display_name -> Varchar,
        /// `WORKER`, `HUB_ADMIN`, or `SUPER_ADMIN`.
        role -> Varchar,
        /// Premium flag.
        is_premium -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issued bearer tokens, one row per token.
    sessions (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning account.
        user_id -> Uuid,
        /// The signed token, unique.
        token -> Varchar,
        /// Hard expiry.
        expires_at -> Timestamptz,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Seeded catalog of third-party delivery platforms.
    delivery_platforms (id) {
        /// Primary key.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// URL-safe identifier, unique.
        slug -> Varchar,
        /// Mobile deep-link scheme.
        deep_link_url -> Nullable<Varchar>,
        /// Web portal fallback.
        web_portal_url -> Nullable<Varchar>,
        /// Package identifier format hint.
        package_id_hint -> Nullable<Varchar>,
        /// Soft-deactivation flag.
        is_active -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user platform associations, unique per (user, platform).
    platform_links (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning worker.
        user_id -> Uuid,
        /// Linked catalog row.
        platform_id -> Uuid,
        /// Per-user display name override.
        display_name -> Nullable<Varchar>,
        /// Stamped by the launch endpoint.
        last_accessed_at -> Nullable<Timestamptz>,
        /// Soft-deactivation flag.
        is_active -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Delivery routes with denormalized progress counters.
    routes (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning worker.
        user_id -> Uuid,
        /// Optional platform link association.
        platform_link_id -> Nullable<Uuid>,
        /// Display name.
        name -> Varchar,
        /// Day the route is driven.
        route_date -> Date,
        /// `ASSIGNED`, `IN_PROGRESS`, `COMPLETED`, or `CANCELLED`.
        status -> Varchar,
        /// Count of stops on the route.
        total_stops -> Int4,
        /// Stops counted into `COMPLETED`.
        completed_stops -> Int4,
        /// Count of packages on the route.
        total_packages -> Int4,
        /// Packages counted into `DELIVERED`.
        delivered_packages -> Int4,
        /// First entry into `IN_PROGRESS`.
        started_at -> Nullable<Timestamptz>,
        /// First entry into `COMPLETED`.
        completed_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stops on a route, ordered by `sequence` (unique per route).
    stops (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning route.
        route_id -> Uuid,
        /// Position within the route, 1-based.
        sequence -> Int4,
        /// Street address.
        address -> Varchar,
        /// Optional short label.
        label -> Nullable<Varchar>,
        /// Free-form worker notes.
        notes -> Nullable<Text>,
        /// `PENDING`, `ARRIVED`, `COMPLETED`, `SKIPPED`, or `ATTEMPTED`.
        status -> Varchar,
        /// First entry into `ARRIVED`.
        arrived_at -> Nullable<Timestamptz>,
        /// First entry into `COMPLETED`.
        completed_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Packages on a route; (route_id, barcode) unique when barcode set.
    packages (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning route.
        route_id -> Uuid,
        /// Stop the parcel is expected at.
        stop_id -> Nullable<Uuid>,
        /// Carrier tracking number.
        tracking_number -> Varchar,
        /// Scan lookup key.
        barcode -> Nullable<Varchar>,
        /// `PENDING`, `SCANNED_IN`, `OUT_FOR_DELIVERY`, `DELIVERED`,
        /// `RETURNED`, or `DAMAGED`.
        status -> Varchar,
        /// Who signed for the parcel.
        recipient_name -> Nullable<Varchar>,
        /// Free-form worker notes.
        notes -> Nullable<Text>,
        /// First entry into `SCANNED_IN`.
        scanned_at -> Nullable<Timestamptz>,
        /// First entry into `DELIVERED`.
        delivered_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only earnings ledger.
    earning_records (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning worker.
        user_id -> Uuid,
        /// Attribution to a platform link.
        platform_link_id -> Nullable<Uuid>,
        /// Base pay in cents.
        amount_cents -> Int8,
        /// Tips in cents.
        tips_cents -> Int8,
        /// ISO 4217 currency code.
        currency -> Varchar,
        /// Day the money was earned.
        earned_on -> Date,
        /// Free-form note.
        note -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Clock-in/clock-out intervals.
    shifts (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning worker.
        user_id -> Uuid,
        /// `ACTIVE`, `COMPLETED`, or `CANCELLED`.
        status -> Varchar,
        /// Clock-in time.
        started_at -> Timestamptz,
        /// First transition out of `ACTIVE`.
        ended_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Organisational groupings of workers.
    hubs (id) {
        /// Primary key.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// Optional city for search.
        city -> Nullable<Varchar>,
        /// Creating user.
        created_by -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Hub memberships; `user_id` is unique (one hub per user).
    hub_memberships (id) {
        /// Primary key.
        id -> Uuid,
        /// The hub.
        hub_id -> Uuid,
        /// The member.
        user_id -> Uuid,
        /// `DRIVER`, `DISPATCHER`, `MANAGER`, or `OWNER`.
        role -> Varchar,
        /// When the user joined.
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Notifications; only the unread count is read today.
    notifications (id) {
        /// Primary key.
        id -> Uuid,
        /// Recipient.
        user_id -> Uuid,
        /// Short title.
        title -> Varchar,
        /// Body text.
        body -> Text,
        /// Read marker.
        read_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(platform_links -> delivery_platforms (platform_id));
diesel::joinable!(hub_memberships -> hubs (hub_id));
diesel::joinable!(hub_memberships -> users (user_id));
diesel::joinable!(stops -> routes (route_id));
diesel::joinable!(packages -> routes (route_id));

diesel::allow_tables_to_appear_in_same_query!(
    delivery_platforms,
    earning_records,
    hub_memberships,
    hubs,
    notifications,
    packages,
    platform_links,
    routes,
    sessions,
    shifts,
    stops,
    users,
);
