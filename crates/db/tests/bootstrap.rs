use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    vnt_db::health_check(&pool).await.unwrap();

    let tables = [
        "longevities",
        "genres",
        "tags",
        "studios",
        "staff",
        "staff_roles",
        "visual_novels",
        "vn_genres",
        "vn_tags",
        "vn_studios",
        "vn_staff",
        "vn_screenshots",
        "users",
        "profiles",
        "statistics_trees",
        "statistics_chapters",
        "translation_items",
        "translation_moderators",
        "translation_subscriptions",
        "translation_beta_links",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Running the embedded migrator again on a migrated database is a no-op.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_migrations_are_idempotent(pool: PgPool) {
    vnt_db::run_migrations(&pool).await.unwrap();
}
