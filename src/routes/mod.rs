pub mod admin;
pub mod assets;
pub mod cors;
pub mod public;

use actix_web::web;

use crate::response::{json_error_handler, path_error_handler, query_error_handler};

/// Extractor failures answer 400 with the usual error body.
fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));
}
