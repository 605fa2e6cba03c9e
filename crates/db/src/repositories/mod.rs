//! Repositories: zero-sized structs with async functions taking `&PgPool`.
//!
//! Every function returns [`vnt_core::error::CoreError`]; driver errors are
//! translated by [`crate::error::map_db_error`].

pub mod beta_link_repo;
pub mod catalog_repo;
pub mod identity_repo;
pub mod screenshot_repo;
pub mod statistics_repo;
pub mod subscription_repo;
pub mod translation_repo;
pub mod visual_novel_repo;

pub use beta_link_repo::BetaLinkRepo;
pub use catalog_repo::CatalogRepo;
pub use identity_repo::{ProfileRepo, UserRepo};
pub use screenshot_repo::ScreenshotRepo;
pub use statistics_repo::StatisticsRepo;
pub use subscription_repo::SubscriptionRepo;
pub use translation_repo::TranslationRepo;
pub use visual_novel_repo::VisualNovelRepo;
