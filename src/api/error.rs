// ==========================================
// 学位项目评估跟踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/引擎错误为用户可读的错误消息
// 约束: 所有错误信息必须包含显式原因与具体字段值
// ==========================================

use crate::engine::saver::EvaluationSaveError;
use crate::i18n;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与校验错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 引用完整性错误
    // ==========================================
    /// 被引用的基础数据不存在（附带排查提示）
    #[error("引用完整性错误: {0}")]
    ReferentialIntegrity(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!(
                    "{} ({})",
                    msg,
                    i18n::t("error.duplicate_hint")
                ))
            }
            RepositoryError::ForeignKeyViolation(msg) => ApiError::ReferentialIntegrity(format!(
                "{} ({})",
                msg,
                i18n::t("error.reference_hint")
            )),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("field={}: {}", field, message))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 EvaluationSaveError 转换
// ==========================================
impl From<EvaluationSaveError> for ApiError {
    fn from(err: EvaluationSaveError) -> Self {
        match err {
            mismatch @ EvaluationSaveError::EnrollmentMismatch { .. } => {
                ApiError::ValidationError(mismatch.to_string())
            }
            EvaluationSaveError::Policy(msg) => ApiError::InternalError(msg),
            EvaluationSaveError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
