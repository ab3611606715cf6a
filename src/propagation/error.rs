use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("sgp4: {0}")]
    Sgp4(String),
    #[error("propagator returned a degenerate state")]
    Degenerate,
}
