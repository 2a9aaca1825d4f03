// Mirrors the tables owned by the hosted data store. This service only reads them.

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        credits -> Int4,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    images (id) {
        id -> Uuid,
        user_id -> Uuid,
        original_url -> Text,
        processed_url -> Nullable<Text>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(images -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(images, users,);
