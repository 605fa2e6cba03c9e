//! Subscription ledger.

mod common;

use sqlx::PgPool;
use vnt_db::repositories::{ProfileRepo, SubscriptionRepo, TranslationRepo, UserRepo};

use common::{count, profile, translation, visual_novel};

#[sqlx::test(migrations = "../../db/migrations")]
async fn subscribing_twice_keeps_one_row(pool: PgPool) {
    let novel = visual_novel(&pool, "Rewrite").await;
    let item = translation(&pool, novel.id).await;
    let reader = profile(&pool, "reader").await;

    assert!(SubscriptionRepo::subscribe(&pool, reader.id, item.id).await.unwrap());
    assert!(!SubscriptionRepo::subscribe(&pool, reader.id, item.id).await.unwrap());

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM translation_subscriptions").await,
        1
    );
    assert!(SubscriptionRepo::is_subscribed(&pool, reader.id, item.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_both_directions(pool: PgPool) {
    let novel = visual_novel(&pool, "Little Busters!").await;
    let first = translation(&pool, novel.id).await;
    let second = translation(&pool, novel.id).await;
    let ann = profile(&pool, "ann").await;
    let ben = profile(&pool, "ben").await;

    SubscriptionRepo::subscribe(&pool, ann.id, first.id).await.unwrap();
    SubscriptionRepo::subscribe(&pool, ann.id, second.id).await.unwrap();
    SubscriptionRepo::subscribe(&pool, ben.id, first.id).await.unwrap();

    let subscribers: Vec<i64> = SubscriptionRepo::list_subscribers(&pool, first.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(subscribers, vec![ann.id, ben.id]);

    let items: Vec<i64> = SubscriptionRepo::list_subscriptions(&pool, ann.id)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(items, vec![first.id, second.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsubscribe(pool: PgPool) {
    let novel = visual_novel(&pool, "Kanon").await;
    let item = translation(&pool, novel.id).await;
    let reader = profile(&pool, "reader").await;

    assert!(!SubscriptionRepo::unsubscribe(&pool, reader.id, item.id).await.unwrap());
    SubscriptionRepo::subscribe(&pool, reader.id, item.id).await.unwrap();
    assert!(SubscriptionRepo::unsubscribe(&pool, reader.id, item.id).await.unwrap());
    assert!(!SubscriptionRepo::is_subscribed(&pool, reader.id, item.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn subscriptions_follow_their_profile_and_item(pool: PgPool) {
    let novel = visual_novel(&pool, "Air").await;
    let kept = translation(&pool, novel.id).await;
    let dropped = translation(&pool, novel.id).await;
    let stays = profile(&pool, "stays").await;
    let leaves = profile(&pool, "leaves").await;

    for profile_id in [stays.id, leaves.id] {
        for item_id in [kept.id, dropped.id] {
            SubscriptionRepo::subscribe(&pool, profile_id, item_id).await.unwrap();
        }
    }
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM translation_subscriptions").await, 4);

    assert!(ProfileRepo::delete(&pool, leaves.id).await.unwrap());
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM translation_subscriptions").await, 2);

    assert!(TranslationRepo::delete(&pool, dropped.id).await.unwrap());
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM translation_subscriptions").await, 1);

    // Removing the user removes the profile and with it the last subscription.
    assert!(UserRepo::delete(&pool, stays.user_id).await.unwrap());
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM translation_subscriptions").await, 0);
    assert!(ProfileRepo::find_by_user(&pool, stays.user_id).await.unwrap().is_none());
}
