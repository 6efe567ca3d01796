//! Core domain logic for the Q&A service.
//! This crate is the single source of truth for user/question invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{default_log_level, ConfigError, CoreConfig, DatabaseLocation, LoggingConfig};
pub use logging::{init_logging, logging_status, LoggingError};
pub use model::question::{Question, QuestionKey, QuestionValidationError};
pub use model::user::{
    PasswordChangeError, UnauthorizedError, UnauthorizedReason, User, UserKey,
    UserValidationError,
};
pub use repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::question_service::{QuestionService, QuestionServiceError};
pub use service::user_service::{UserService, UserServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
