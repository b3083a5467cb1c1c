use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::notify::Notifier;
use crate::repository::{CommentRepository, NewComment};
use crate::response::MessageDto;
use crate::routes::assets;

pub fn config(cfg: &mut web::ServiceConfig) {
    super::extractor_config(cfg);
    cfg.service(
        web::resource("/api/comments")
            .route(web::get().to(list_comments))
            .route(web::post().to(create_comment)),
    )
    .service(web::resource("/static/{path:.*}").route(web::get().to(assets::serve)));
}

#[derive(Deserialize)]
struct ArticleQuery {
    article_url: Option<String>,
}

#[derive(Deserialize)]
struct CreateCommentRequest {
    article_url: Option<String>,
    parent_id: Option<i32>,
    nickname: Option<String>,
    email: Option<String>,
    content: Option<String>,
}

impl From<CreateCommentRequest> for NewComment {
    fn from(req: CreateCommentRequest) -> Self {
        Self {
            article_url: req.article_url.unwrap_or_default(),
            parent_id: req.parent_id,
            nickname: req.nickname.unwrap_or_default(),
            email: req.email,
            content: req.content.unwrap_or_default(),
        }
    }
}

async fn list_comments(
    repo: web::Data<CommentRepository>,
    query: web::Query<ArticleQuery>,
) -> Result<HttpResponse, AppError> {
    let article_url = query
        .article_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::param_error("article_url parameter required"))?;

    let comments = repo.comments_by_article(article_url).await?;
    Ok(HttpResponse::Ok().json(comments))
}

async fn create_comment(
    repo: web::Data<CommentRepository>,
    notifier: web::Data<Notifier>,
    payload: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, AppError> {
    let created = repo.create_comment(payload.into_inner().into()).await?;
    notifier.notify(&created);
    Ok(HttpResponse::Created().json(MessageDto::new("Comment created, pending approval")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::memory_db;
    use crate::routes::assets::StaticAssets;
    use crate::routes::cors::cors_handler;
    use actix_web::{http::StatusCode, middleware::from_fn, test, App};
    use serde_json::{json, Value};

    macro_rules! public_app {
        ($repo:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($repo.clone()))
                    .app_data(web::Data::new(Notifier::disabled()))
                    .app_data(web::Data::new(StaticAssets::new("./does-not-exist")))
                    .wrap(from_fn(cors_handler))
                    .configure(config),
            )
            .await
        };
    }

    async fn repo() -> CommentRepository {
        CommentRepository::new(memory_db().await)
    }

    #[actix_web::test]
    async fn test_get_requires_article_url() {
        let repo = repo().await;
        let app = public_app!(repo);

        for uri in ["/api/comments", "/api/comments?article_url="] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "article_url parameter required");
        }
    }

    #[actix_web::test]
    async fn test_post_creates_pending_comment() {
        let repo = repo().await;
        let app = public_app!(repo);

        let req = test::TestRequest::post()
            .uri("/api/comments")
            .set_json(json!({"article_url": "/post/1", "nickname": "bob", "content": "hi"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Comment created, pending approval");

        // pending comments stay hidden
        let req = test::TestRequest::get()
            .uri("/api/comments?article_url=/post/1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn test_post_rejects_bad_input() {
        let repo = repo().await;
        let app = public_app!(repo);

        let cases = [
            (json!({"article_url": "/p", "content": "hi"}), "Missing required fields"),
            (
                json!({"article_url": "/p", "nickname": "bob", "content": "x".repeat(2001)}),
                "Field length exceeds maximum allowed",
            ),
            (
                json!({"article_url": "/p", "parent_id": 99999, "nickname": "bob", "content": "hi"}),
                "Parent comment not found",
            ),
        ];
        for (payload, message) in cases {
            let req = test::TestRequest::post()
                .uri("/api/comments")
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], message);
        }
    }

    #[actix_web::test]
    async fn test_post_rejects_malformed_json() {
        let repo = repo().await;
        let app = public_app!(repo);

        let req = test::TestRequest::post()
            .uri("/api/comments")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid JSON");
    }

    #[actix_web::test]
    async fn test_reply_to_existing_parent() {
        let repo = repo().await;
        let app = public_app!(repo);
        let parent = repo
            .create_comment(NewComment {
                article_url: "/post/1".into(),
                nickname: "bob".into(),
                content: "hi".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let req = test::TestRequest::post()
            .uri("/api/comments")
            .set_json(json!({
                "article_url": "/post/1",
                "parent_id": parent.id,
                "nickname": "alice",
                "email": "alice@example.com",
                "content": "re"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_preflight() {
        let repo = repo().await;
        let app = public_app!(repo);

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/comments")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, POST, OPTIONS"
        );
    }
}
