mod catalog;
mod export;
mod health;
mod view;

pub use catalog::get_catalog;
pub use export::{export_csv, recommendation};
pub use health::health_check;
pub use view::{get_block_view, get_district_view, get_gp_view, get_root_view, post_view};
