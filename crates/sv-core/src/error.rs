use thiserror::Error;

pub type SvResult<T> = Result<T, SvError>;

#[derive(Error, Debug)]
pub enum SvError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid color literal: {literal}")]
    InvalidColor { literal: String },
}
