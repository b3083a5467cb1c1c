mod admin_page;
mod config;
mod db;
mod entity;
mod error;
mod notify;
mod repository;
mod response;
mod routes;

use std::io;
use std::time::Duration;

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use config::AppConfig;
use db::connect_db;
use log::{info, warn};
use notify::{spawn_notifier, BarkConfig};
use repository::CommentRepository;
use routes::assets::StaticAssets;
use routes::{admin, public};

use crate::admin_page::AdminPage;

const NOTIFIER_GRACE: Duration = Duration::from_secs(6);

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = AppConfig::parse();

    let db = connect_db(&config).await.map_err(|e| {
        log::error!("failed to open database {}: {}", config.db_path, e);
        io::Error::other(e)
    })?;
    let repo = CommentRepository::new(db);

    let admin_page = AdminPage::load(config.admin_template.as_deref())?;
    let assets = StaticAssets::new(config.static_dir.clone());

    let bark = config.bark_device_key().map(|key| BarkConfig {
        server: config.bark_server.clone(),
        device_key: key.to_string(),
    });
    let (notifier, notifier_worker) = spawn_notifier(bark);

    let repo_data = web::Data::new(repo);
    let notifier_data = web::Data::new(notifier);
    let assets_data = web::Data::new(assets);
    let admin_page_data = web::Data::new(admin_page);

    let public_server = {
        let repo = repo_data.clone();
        let notifier = notifier_data.clone();
        let assets = assets_data.clone();
        HttpServer::new(move || {
            App::new()
                .app_data(repo.clone())
                .app_data(notifier.clone())
                .app_data(assets.clone())
                .wrap(actix_web::middleware::from_fn(routes::cors::cors_handler))
                .wrap(middleware::Logger::default())
                .configure(public::config)
        })
        .bind((config.bind.as_str(), config.public_port))?
        .run()
    };

    let admin_server = {
        let repo = repo_data.clone();
        let admin_page = admin_page_data.clone();
        HttpServer::new(move || {
            App::new()
                .app_data(repo.clone())
                .app_data(admin_page.clone())
                .wrap(middleware::Logger::default())
                .configure(admin::config)
        })
        .bind((config.bind.as_str(), config.admin_port))?
        .run()
    };

    info!("iComment server started");
    info!("database: {}", config.db_path);
    info!("static assets: {}", assets_data.root().display());
    info!("public: http://{}:{}", config.bind, config.public_port);
    info!("admin: http://{}:{}", config.bind, config.admin_port);
    info!(
        "bark: {}",
        if notifier_data.is_enabled() { "enabled" } else { "disabled" }
    );
    warn!("admin listener has no authentication, keep it off public networks");

    let result = futures_util::future::try_join(public_server, admin_server).await;

    drop(notifier_data);
    if let Some(worker) = notifier_worker {
        worker.shutdown(NOTIFIER_GRACE).await;
    }
    result.map(|_| ())
}
