//! Catalog entries, weighted associations and their delete rules.

mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_db::models::catalog::{
    AssociationKind, CatalogKind, CreateCatalogEntry, UpdateCatalogEntry,
};
use vnt_db::models::visual_novel::UpdateVisualNovel;
use vnt_db::repositories::{CatalogRepo, VisualNovelRepo};

use common::{count, new_visual_novel, visual_novel};

fn entry(title: &str) -> CreateCatalogEntry {
    CreateCatalogEntry {
        title: title.to_string(),
        description: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn crud_for_every_kind(pool: PgPool) {
    for kind in CatalogKind::ALL {
        let created = CatalogRepo::create(&pool, kind, &entry("Mystery")).await.unwrap();
        assert_eq!(created.description, "");

        let updated = CatalogRepo::update(
            &pool,
            kind,
            created.id,
            &UpdateCatalogEntry {
                description: Some("Whodunits".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Mystery");
        assert_eq!(updated.description, "Whodunits");

        assert_eq!(CatalogRepo::list(&pool, kind).await.unwrap().len(), 1);
        assert!(CatalogRepo::delete(&pool, kind, created.id).await.unwrap());
        assert_matches!(
            CatalogRepo::find_by_id(&pool, kind, created.id).await,
            Err(CoreError::NotFound { .. })
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_titles_are_rejected(pool: PgPool) {
    assert_matches!(
        CatalogRepo::create(&pool, CatalogKind::Tag, &entry("   ")).await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        CatalogRepo::create(&pool, CatalogKind::Tag, &entry(&"t".repeat(257))).await,
        Err(CoreError::Validation(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attachments_are_ordered_by_weight(pool: PgPool) {
    let novel = visual_novel(&pool, "Higurashi").await;
    let horror = CatalogRepo::create(&pool, CatalogKind::Genre, &entry("Horror")).await.unwrap();
    let mystery = CatalogRepo::create(&pool, CatalogKind::Genre, &entry("Mystery")).await.unwrap();

    CatalogRepo::attach(&pool, AssociationKind::Genre, novel.id, horror.id, None).await.unwrap();
    CatalogRepo::attach(&pool, AssociationKind::Genre, novel.id, mystery.id, Some(5)).await.unwrap();

    let listed = CatalogRepo::list_attached(&pool, AssociationKind::Genre, novel.id).await.unwrap();
    let order: Vec<(&str, i32)> = listed.iter().map(|e| (e.title.as_str(), e.weight)).collect();
    assert_eq!(order, vec![("Mystery", 5), ("Horror", 0)]);

    // Attaching again only changes the weight.
    CatalogRepo::attach(&pool, AssociationKind::Genre, novel.id, horror.id, Some(9)).await.unwrap();
    let listed = CatalogRepo::list_attached(&pool, AssociationKind::Genre, novel.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].entry_id, horror.id);
    assert_eq!(listed[0].weight, 9);

    assert_matches!(
        CatalogRepo::attach(&pool, AssociationKind::Genre, novel.id, horror.id, Some(-1)).await,
        Err(CoreError::Validation(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attached_entry_cannot_be_deleted(pool: PgPool) {
    let novel = visual_novel(&pool, "Katawa Shoujo").await;
    let studio = CatalogRepo::create(&pool, CatalogKind::Studio, &entry("Four Leaf")).await.unwrap();
    CatalogRepo::attach(&pool, AssociationKind::Studio, novel.id, studio.id, None).await.unwrap();

    let err = CatalogRepo::delete(&pool, CatalogKind::Studio, studio.id).await.unwrap_err();
    assert_matches!(
        err,
        CoreError::ReferentialConflict { ref entity, ref constraint }
            if entity == "studios" && constraint.contains("vn_studios.studio_id")
    );

    assert!(CatalogRepo::detach(&pool, AssociationKind::Studio, novel.id, studio.id).await.unwrap());
    assert!(!CatalogRepo::detach(&pool, AssociationKind::Studio, novel.id, studio.id).await.unwrap());
    assert!(CatalogRepo::delete(&pool, CatalogKind::Studio, studio.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attaching_to_missing_rows_is_a_validation_error(pool: PgPool) {
    let novel = visual_novel(&pool, "Planetarian").await;
    assert_matches!(
        CatalogRepo::attach(&pool, AssociationKind::Tag, novel.id, 9999, None).await,
        Err(CoreError::Validation(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn staff_credits(pool: PgPool) {
    let novel = visual_novel(&pool, "Chaos;Head").await;
    let person = CatalogRepo::create(&pool, CatalogKind::Staff, &entry("Chiyomaru")).await.unwrap();
    let writer = CatalogRepo::create(&pool, CatalogKind::StaffRole, &entry("Scenario")).await.unwrap();
    let producer = CatalogRepo::create(&pool, CatalogKind::StaffRole, &entry("Producer")).await.unwrap();

    CatalogRepo::attach_staff(&pool, novel.id, person.id, writer.id, Some(1)).await.unwrap();
    CatalogRepo::attach_staff(&pool, novel.id, person.id, producer.id, Some(3)).await.unwrap();

    let credits = CatalogRepo::list_staff(&pool, novel.id).await.unwrap();
    let roles: Vec<&str> = credits.iter().map(|c| c.role_title.as_str()).collect();
    assert_eq!(roles, vec!["Producer", "Scenario"]);
    assert!(credits.iter().all(|c| c.staff_title == "Chiyomaru"));

    assert_matches!(
        CatalogRepo::delete(&pool, CatalogKind::StaffRole, writer.id).await,
        Err(CoreError::ReferentialConflict { .. })
    );
    assert!(CatalogRepo::detach_staff(&pool, novel.id, person.id, writer.id).await.unwrap());
    assert_eq!(CatalogRepo::list_staff(&pool, novel.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_novel_cascades_to_associations(pool: PgPool) {
    let novel = visual_novel(&pool, "Narcissu").await;
    let tag = CatalogRepo::create(&pool, CatalogKind::Tag, &entry("Short")).await.unwrap();
    CatalogRepo::attach(&pool, AssociationKind::Tag, novel.id, tag.id, None).await.unwrap();
    sqlx::query("INSERT INTO vn_screenshots (visual_novel_id, image_path) VALUES ($1, 'x.png')")
        .bind(novel.id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(VisualNovelRepo::delete(&pool, novel.id).await.unwrap());

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM vn_tags").await, 0);
    CatalogRepo::find_by_id(&pool, CatalogKind::Tag, tag.id).await.unwrap();
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM vn_screenshots WHERE visual_novel_id IS NULL").await,
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn longevity_in_use_cannot_be_deleted(pool: PgPool) {
    let longevity = CatalogRepo::create(&pool, CatalogKind::Longevity, &entry("10-30 hours"))
        .await
        .unwrap();
    let mut input = new_visual_novel("Little Busters");
    input.longevity_id = Some(longevity.id);
    VisualNovelRepo::create(&pool, &input).await.unwrap();

    assert_matches!(
        CatalogRepo::delete(&pool, CatalogKind::Longevity, longevity.id).await,
        Err(CoreError::ReferentialConflict { .. })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn visual_novel_fields_are_validated(pool: PgPool) {
    let mut zero_vndb = new_visual_novel("Bad");
    zero_vndb.vndb_id = 0;
    assert_matches!(
        VisualNovelRepo::create(&pool, &zero_vndb).await,
        Err(CoreError::Validation(_))
    );

    let mut bad_link = new_visual_novel("Bad");
    bad_link.steam_link = Some("steam://run/1".to_string());
    assert_matches!(
        VisualNovelRepo::create(&pool, &bad_link).await,
        Err(CoreError::Validation(_))
    );

    let mut long_alias = new_visual_novel("Bad");
    long_alias.alias = Some("a".repeat(31));
    assert_matches!(
        VisualNovelRepo::create(&pool, &long_alias).await,
        Err(CoreError::Validation(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn visual_novel_update_and_publish(pool: PgPool) {
    let novel = visual_novel(&pool, "Draft title").await;

    let updated = VisualNovelRepo::update(
        &pool,
        novel.id,
        &UpdateVisualNovel {
            title: Some("Final title".to_string()),
            alias: Some("ft".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "Final title");
    assert_eq!(updated.alias, "ft");
    assert_eq!(updated.vndb_id, novel.vndb_id);

    VisualNovelRepo::set_published(&pool, novel.id, false).await.unwrap();
    assert!(VisualNovelRepo::list(&pool, false).await.unwrap().is_empty());
    assert_eq!(VisualNovelRepo::list(&pool, true).await.unwrap().len(), 1);

    assert_matches!(
        VisualNovelRepo::update(&pool, 9999, &UpdateVisualNovel::default()).await,
        Err(CoreError::NotFound { .. })
    );
}
