/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("invalid row: {0}")]
    InvalidRow(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store did not answer in time")]
    TimedOut,
}
