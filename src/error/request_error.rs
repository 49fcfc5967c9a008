use crate::response::app_response::{ErrorResponse, ValidationErrorDetail};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, Request};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Path(#[from] PathRejection),
    #[error(transparent)]
    Query(#[from] QueryRejection),
}

/// JSON body extractor that runs `validator` rules before the handler sees the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedRequest<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedRequest<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedRequest(value))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::Validation(validation_errors) => ErrorResponse::with_validation_errors(
                "Validation failed".to_string(),
                validation_details(&validation_errors),
            )
            .with_status(StatusCode::BAD_REQUEST)
            .into_response(),
            other => ErrorResponse::send(other.to_string())
                .with_status(StatusCode::BAD_REQUEST)
                .into_response(),
        }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                ValidationErrorDetail::new(
                    field.to_string(),
                    semantic_type(&error.code).to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                )
            })
        })
        .collect();
    // field_errors() is backed by a HashMap
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

fn semantic_type(code: &str) -> &'static str {
    match code {
        "email" => "INVALID_FORMAT",
        "length" => "INVALID_LENGTH",
        "required" => "MISSING",
        "range" => "OUT_OF_RANGE",
        _ => "INVALID_VALUE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct SignupForm {
        #[validate(email(message = "Email format is invalid"))]
        email: String,
        #[validate(length(min = 1, message = "Token is required"))]
        token: String,
    }

    #[test]
    fn test_validation_details_are_sorted_and_typed() {
        let form = SignupForm {
            email: "nope".to_string(),
            token: String::new(),
        };
        let errors = form.validate().unwrap_err();
        let details = validation_details(&errors);

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "email");
        assert_eq!(details[0].r#type, "INVALID_FORMAT");
        assert_eq!(details[1].field, "token");
        assert_eq!(details[1].r#type, "INVALID_LENGTH");
        assert_eq!(details[1].details, "Token is required");
    }
}
