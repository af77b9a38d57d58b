use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;

use super::app_error::AppError;
use super::translator::ErrorTranslator;

/// Error raised by a handler, parked in the response extensions until
/// [`translate_errors`] picks it up
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Bare 500 unless the translation middleware replaces it
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(RaisedError(Arc::new(self)));
        response
    }
}

/// Middleware handing every raised error to the translator
pub async fn translate_errors(
    State(translator): State<ErrorTranslator>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<RaisedError>() {
        Some(RaisedError(err)) => translator.translate(&err).into_response(),
        None => response,
    }
}

/// Response builder for `tower_http::catch_panic::CatchPanicLayer::custom`
pub fn panic_handler(
    translator: ErrorTranslator,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |payload: Box<dyn Any + Send + 'static>| {
        translator
            .translate_panic(panic_message(&*payload))
            .into_response()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else {
        "handler panicked"
    }
}
