//! Diesel table definitions for the workflow state store.

diesel::table! {
    workflow_executions (id) {
        id -> Uuid,
        owner -> Text,
        name -> Text,
        config -> Jsonb,
        status -> Text,
        version -> Int8,
        error_message -> Nullable<Text>,
        results -> Nullable<Jsonb>,
        started_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    research_sessions (id) {
        id -> Uuid,
        workflow_id -> Nullable<Uuid>,
        sources -> Jsonb,
        search_query -> Text,
        max_items -> Int4,
        depth -> Text,
        status -> Text,
        results_count -> Int4,
        raw_data -> Jsonb,
        insights -> Nullable<Jsonb>,
        error_message -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    script_generations (id) {
        id -> Uuid,
        workflow_id -> Nullable<Uuid>,
        session_id -> Nullable<Uuid>,
        title -> Text,
        content -> Text,
        content_type -> Text,
        model -> Text,
        audience -> Text,
        style -> Text,
        target_duration_secs -> Nullable<Int4>,
        quality_score -> Float4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    video_generation_tasks (id) {
        id -> Uuid,
        workflow_id -> Uuid,
        script -> Text,
        avatar_id -> Text,
        voice_id -> Text,
        aspect_ratio -> Text,
        provider_task_id -> Nullable<Text>,
        status -> Text,
        video_url -> Nullable<Text>,
        thumbnail_url -> Nullable<Text>,
        duration_secs -> Nullable<Float4>,
        error_message -> Nullable<Text>,
        submitted_at -> Timestamptz,
        last_polled_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    workflow_approvals (id) {
        id -> Uuid,
        workflow_id -> Uuid,
        title -> Text,
        content -> Text,
        video_url -> Nullable<Text>,
        artifact_hash -> Text,
        status -> Text,
        approver -> Nullable<Text>,
        feedback -> Nullable<Text>,
        requested_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    publication_records (id) {
        id -> Uuid,
        workflow_id -> Uuid,
        platform -> Text,
        platform_post_id -> Nullable<Text>,
        status -> Text,
        error_message -> Nullable<Text>,
        views -> Int8,
        likes -> Int8,
        shares -> Int8,
        comments -> Int8,
        scheduled_for -> Nullable<Timestamptz>,
        published_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    workflow_executions,
    research_sessions,
    script_generations,
    video_generation_tasks,
    workflow_approvals,
    publication_records,
);
