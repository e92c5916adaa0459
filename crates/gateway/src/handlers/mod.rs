//! API handlers module

pub mod chat;
pub mod health;
pub mod properties;

use axum::extract::FromRequest;
use proppilot_common::errors::AppError;

/// JSON body extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
