pub mod url_validation;
pub use url_validation::{UrlValidationError, endpoint_url, validate_backend_url};
