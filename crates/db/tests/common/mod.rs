//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::PgPool;
use vnt_db::models::identity::{CreateUser, Profile, User};
use vnt_db::models::translation::{CreateTranslationItem, TranslationItem};
use vnt_db::models::visual_novel::{CreateVisualNovel, VisualNovel};
use vnt_db::repositories::{ProfileRepo, TranslationRepo, UserRepo, VisualNovelRepo};

pub fn new_visual_novel(title: &str) -> CreateVisualNovel {
    CreateVisualNovel {
        title: title.to_string(),
        alternative_title: None,
        description: None,
        poster_path: "vn/posters/cover.jpg".to_string(),
        date_of_release: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
        vndb_id: 17,
        steam_link: None,
        longevity_id: None,
        alias: None,
        is_published: None,
    }
}

pub async fn visual_novel(pool: &PgPool, title: &str) -> VisualNovel {
    VisualNovelRepo::create(pool, &new_visual_novel(title))
        .await
        .unwrap()
}

pub async fn translation(pool: &PgPool, visual_novel_id: i64) -> TranslationItem {
    TranslationRepo::create(
        pool,
        &CreateTranslationItem {
            visual_novel_id,
            is_published: None,
        },
    )
    .await
    .unwrap()
}

pub async fn user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: None,
        },
    )
    .await
    .unwrap()
}

pub async fn profile(pool: &PgPool, username: &str) -> Profile {
    let user = user(pool, username).await;
    ProfileRepo::create(pool, user.id, Some(username)).await.unwrap()
}

pub async fn count(pool: &PgPool, sql: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await.unwrap();
    n
}
