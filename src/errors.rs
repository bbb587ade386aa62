use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::{Display, Error};

#[derive(Debug, Clone, Display, Error, serde::Deserialize, serde::Serialize)]
pub enum BotError {
    #[display(fmt = "bad input format")]
    Format,

    #[display(fmt = "not on the allow list")]
    NotAllowed,

    #[display(fmt = "record already exists")]
    Duplicate,

    #[display(fmt = "not found")]
    NotFound,

    #[display(fmt = "storage failure")]
    Persistence,
}

impl error::ResponseError for BotError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::html())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            BotError::Format => StatusCode::BAD_REQUEST,
            BotError::NotAllowed => StatusCode::FORBIDDEN,
            BotError::Duplicate => StatusCode::CONFLICT,
            BotError::NotFound => StatusCode::NOT_FOUND,
            BotError::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
