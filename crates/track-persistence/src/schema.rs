//! Tablas Diesel declaradas a mano; `diesel print-schema` produce lo mismo.

diesel::table! {
    workflow_schemes (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        default_workflow -> Nullable<Text>,
        mappings -> Jsonb,
        last_modified -> Timestamptz,
        last_modified_user -> Text,
    }
}

diesel::table! {
    workflow_scheme_drafts (parent_id) {
        parent_id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        default_workflow -> Nullable<Text>,
        mappings -> Jsonb,
        last_modified -> Timestamptz,
        last_modified_user -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    workflow_schemes,
    workflow_scheme_drafts,
);
