pub mod routes;

use crate::context::AppContext;
use crate::error::Result;
use actix_web::{middleware, web, App, HttpServer};

pub use routes::{configure, HealthResponse, QueryRequest};

/// serve the form and json api until the process is stopped
pub async fn serve(ctx: AppContext, bind: &str) -> Result<()> {
    let data = web::Data::new(ctx);

    tracing::info!("listening on http://{}", bind);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await?;

    tracing::info!("server stopped");
    Ok(())
}
