pub mod url_validation;
pub use url_validation::{
    UrlValidationError, derive_ws_url, join_path, resolve_reference, validate_url,
};
