//! Row structs (`FromRow + Serialize`) and create/update DTOs
//! (`Deserialize + Validate`) for every table.

pub mod beta_link;
pub mod catalog;
pub mod identity;
pub mod screenshot;
pub mod statistics;
pub mod translation;
pub mod visual_novel;
