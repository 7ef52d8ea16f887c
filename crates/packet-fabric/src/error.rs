use thiserror::Error;

#[derive(Error, Debug)]
pub enum FabricError {
    #[error("socket bind failed: {0}")]
    BindFailed(std::io::Error),
    #[error("accept failed: {0}")]
    AcceptFailed(std::io::Error),
    #[error("submission queue full")]
    SqFull,
    #[error("io_uring submit failed: {0}")]
    SubmitFailed(std::io::Error),
    #[error("fabric not started")]
    NotStarted,
    #[error("{0}")]
    Custom(String),
}
