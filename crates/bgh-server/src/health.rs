use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::web;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

async fn liveness() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

async fn readiness(ready: web::Data<Arc<AtomicBool>>) -> impl Responder {
    if ready.load(Ordering::SeqCst) {
        HttpResponse::Ok().body("ready")
    } else {
        HttpResponse::ServiceUnavailable().body("starting")
    }
}

/// Serve `/liveness`, `/readiness`, `/healthz`. Readiness flips true only
/// after the manager booted; liveness is up from process start.
pub fn serve(addr: String, ready: Arc<AtomicBool>) -> std::io::Result<()> {
    let ready = web::Data::new(ready);
    actix_web::rt::System::new().block_on(async move {
        log::info!("health endpoints on {}", addr);
        HttpServer::new(move || {
            App::new()
                .app_data(ready.clone())
                .route("/liveness", web::get().to(liveness))
                .route("/readiness", web::get().to(readiness))
                .route("/healthz", web::get().to(liveness))
        })
        .workers(1)
        .bind(addr)?
        .run()
        .await
    })
}
