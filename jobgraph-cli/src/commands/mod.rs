pub mod plan;
pub mod submit;
pub mod validate;
