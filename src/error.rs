//! Error taxonomy for the estimator.

/// Errors raised while validating inputs, loading a profile or rendering results.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EtaError {
    /// A field holds a value outside its declared domain.
    #[error("Invalid input: {field} = {value:?}")]
    InvalidInput { field: &'static str, value: String },
    /// A deployment profile is incomplete or breaks a rule shape.
    #[error("Profile '{profile}' is misconfigured: {detail}")]
    Configuration { profile: String, detail: String },
    /// A result could not be rendered for output.
    #[error("Failed to render output: {0}")]
    Output(String),
}

impl EtaError {
    pub fn invalid(field: &'static str, value: impl ToString) -> Self {
        EtaError::InvalidInput {
            field,
            value: value.to_string(),
        }
    }

    pub fn output(cause: impl ToString) -> Self {
        EtaError::Output(cause.to_string())
    }

    pub fn configuration(profile: impl Into<String>, detail: impl Into<String>) -> Self {
        EtaError::Configuration {
            profile: profile.into(),
            detail: detail.into(),
        }
    }
}
