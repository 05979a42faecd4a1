pub type LumicardResult<T> = Result<T, LumicardError>;

#[derive(thiserror::Error, Debug)]
pub enum LumicardError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LumicardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            LumicardError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            LumicardError::config("x")
                .to_string()
                .contains("config error:")
        );
        assert!(
            LumicardError::asset("x")
                .to_string()
                .contains("asset error:")
        );
        assert!(
            LumicardError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = LumicardError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
