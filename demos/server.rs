//! Minimal Actix Web API that accepts the tokens minted by [`TokenIssuer`].
//!
//! This server exposes two endpoints:
//! - `/`: Returns a greeting and the verified token claims.
//! - `/items/{item_id}`: Echoes the item id and optional `q` query parameter
//!   together with the verified claims.
//!
//! The shared secret is read from the `API_JWT_SECRET` environment variable.
//!
//! [`TokenIssuer`]: mobile_api_auth::TokenIssuer

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use mobile_api_auth::{Claims, TokenVerifier};
use serde::Deserialize;
use serde_json::json;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let verifier = match TokenVerifier::from_env() {
        Ok(verifier) => verifier,
        Err(e) => {
            eprintln!("Failed to initialize token verification: {e}");
            std::process::exit(1);
        }
    };
    let verifier = web::Data::new(verifier);

    HttpServer::new(move || {
        App::new()
            .app_data(verifier.clone())
            .service(read_root)
            .service(read_item)
    })
    .bind(("127.0.0.1", 8000))?
    .run()
    .await
}

#[derive(Deserialize)]
struct ItemQuery {
    q: Option<String>,
}

#[get("/")]
async fn read_root(user: Claims) -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Welcome to the API!", "user": user }))
}

#[get("/items/{item_id}")]
async fn read_item(
    item_id: web::Path<i64>,
    query: web::Query<ItemQuery>,
    user: Claims,
) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "item_id": item_id.into_inner(),
        "query": query.into_inner().q,
        "user": user,
    }))
}
