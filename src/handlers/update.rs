use actix_web::{post, web, HttpResponse, Responder};

use crate::dto::InboundUpdate;
use crate::service::dispatch::{self, AppState};

/// The transport gateway: one inbound chat event in, the ordered list of
/// outbound replies out. Delivery of the replies is the caller's job.
#[post("/update")]
pub async fn update(
   inbound: web::Json<InboundUpdate>,
   state: web::Data<AppState>,
) -> impl Responder {
   let replies = dispatch::dispatch(state.get_ref(), inbound.into_inner()).await;
   HttpResponse::Ok().json(replies)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(update);
}
