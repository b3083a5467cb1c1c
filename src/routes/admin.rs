use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::admin_page::AdminPage;
use crate::error::AppError;
use crate::repository::{
    total_pages, AdminComment, CommentFilter, CommentRepository, StatusFilter, ADMIN_PAGE_SIZE,
};
use crate::response::MessageDto;

pub fn config(cfg: &mut web::ServiceConfig) {
    super::extractor_config(cfg);
    cfg.service(web::resource("/").route(web::get().to(page)))
        .service(web::resource("/comments").route(web::get().to(list)))
        .service(web::resource("/comments/{id}").route(web::delete().to(remove)))
        .service(web::resource("/comments/{id}/approve").route(web::patch().to(approve)));
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<String>,
    article_url: Option<String>,
    email: Option<String>,
    page: Option<String>,
}

#[derive(Serialize)]
struct ListResponse {
    comments: Vec<AdminComment>,
    total: u64,
    page: u64,
    total_pages: u64,
    page_size: u64,
}

fn parse_filter(query: ListQuery) -> Result<CommentFilter, AppError> {
    let status = query
        .status
        .as_deref()
        .unwrap_or("")
        .parse::<StatusFilter>()
        .map_err(|_| AppError::param_error("Invalid status filter"))?;
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);

    Ok(CommentFilter {
        status,
        article_url: query.article_url.unwrap_or_default(),
        email: query.email.unwrap_or_default(),
        page,
        page_size: ADMIN_PAGE_SIZE,
    })
}

async fn list(
    repo: web::Data<CommentRepository>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = parse_filter(query.into_inner())?;
    let result = repo.list_filtered(&filter).await?;

    let response = ListResponse {
        total_pages: total_pages(result.total, filter.page_size),
        comments: result.comments.into_iter().map(AdminComment::from).collect(),
        total: result.total,
        page: filter.page,
        page_size: filter.page_size,
    };
    Ok(HttpResponse::Ok().json(response))
}

async fn page(
    repo: web::Data<CommentRepository>,
    admin_page: web::Data<AdminPage>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = parse_filter(query.into_inner())?;
    let result = repo.list_filtered(&filter).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(admin_page.render(&filter, &result)))
}

async fn remove(
    repo: web::Data<CommentRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    repo.delete_comment(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn approve(
    repo: web::Data<CommentRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    repo.approve_comment(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageDto::new("Comment approved")))
}
