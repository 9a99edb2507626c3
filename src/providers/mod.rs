mod http_errors;
pub mod openrouter;
