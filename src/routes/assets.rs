use std::path::{Component, Path, PathBuf};

use actix_web::{http::header, web, HttpResponse};

use crate::error::AppError;

/// Directory of widget assets, injected at start-up.
#[derive(Clone, Debug)]
pub struct StaticAssets {
    root: PathBuf,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Only plain relative paths resolve; `..`, roots and prefixes never do.
    fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let rel = Path::new(rel);
        if rel.as_os_str().is_empty() {
            return None;
        }
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(rel))
    }
}

pub async fn serve(
    assets: web::Data<StaticAssets>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file = assets
        .resolve(&path)
        .ok_or_else(|| AppError::not_found("Not found"))?;
    let content = tokio::fs::read(&file)
        .await
        .map_err(|_| AppError::not_found("Not found"))?;

    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    let mut resp = HttpResponse::Ok();
    resp.insert_header((header::CONTENT_TYPE, mime.essence_str().to_string()));
    if file.extension().and_then(|e| e.to_str()) == Some("js") {
        resp.insert_header((header::CACHE_CONTROL, "public, max-age=3600"));
    }
    Ok(resp.body(content))
}
