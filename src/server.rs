// src/server.rs
//! HTTP endpoint serving the latest fix as JSON

use crate::{error::Result, gps::FixStore};
use actix_web::{
    dev::Server, http::header::ContentType, middleware::Logger, web, App, HttpResponse, HttpServer,
};
use log::{error, info};

/// `GET /`: the current fix with its age
pub async fn fix_handler(store: web::Data<FixStore>) -> HttpResponse {
    let view = store.snapshot();
    match serde_json::to_vec(&view) {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body),
        Err(e) => {
            error!("Failed to serialize fix: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(fix_handler));
}

/// Bind the HTTP server. The returned server runs when awaited and stops on
/// Ctrl-C or through its handle.
pub fn build(store: FixStore, bind_address: &str) -> Result<Server> {
    info!("Starting HTTP server on {}", bind_address);

    let data = web::Data::new(store);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(bind_address)?
    .run();

    Ok(server)
}
