//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered users. `public_token` and `external_id` are each unique.
    app_users (id) {
        id -> Int8,
        /// Opaque token handed to clients (max 64 characters).
        public_token -> Varchar,
        /// Identifier issued by the upstream messaging platform.
        external_id -> Int8,
        user_name -> Varchar,
        registered_at -> Timestamptz,
    }
}

diesel::table! {
    /// Routes owned by a user; deleted with their owner.
    routes (id) {
        id -> Int4,
        user_id -> Int8,
        route_name -> Varchar,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Waypoints of a route; removed by `ON DELETE CASCADE` with the route.
    waypoints (id) {
        id -> Int4,
        route_id -> Int4,
        waypoint_name -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        /// Zero-based position in the submitted list; never renumbered.
        order_index -> Int4,
    }
}

diesel::table! {
    /// Append-only command log used as the broker.
    command_log (seq) {
        seq -> Int8,
        topic -> Varchar,
        message_key -> Varchar,
        headers -> Jsonb,
        payload -> Bytea,
        published_at -> Timestamptz,
    }
}

diesel::table! {
    /// Next unconsumed sequence number per consumer group and topic.
    consumer_offsets (consumer_group, topic) {
        consumer_group -> Varchar,
        topic -> Varchar,
        next_seq -> Int8,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(routes -> app_users (user_id));
diesel::joinable!(waypoints -> routes (route_id));

diesel::allow_tables_to_appear_in_same_query!(app_users, routes, waypoints);
