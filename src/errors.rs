use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path could not be resolved: {0}")]
    Canonicalize(#[from] std::io::Error),
    #[error("Path to user's data directory could not be detected")]
    DataDir,
    #[error("`{0}` exists but is not a directory")]
    NotADirectory(String),
    #[error("File `{0}` already exists, refusing to overwrite it")]
    Exists(String),
}
