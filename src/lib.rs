// ==========================================
// 学位项目评估跟踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 认证评估数据的记录与报告
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 策略配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssociationRule, CoverageStatus, EnrollmentRule, Term};

// 领域实体
pub use domain::{
    Course, CourseRequirement, Degree, EvalKey, EvalValues, EvaluationBatch, EvaluationEntry,
    Instructor, LearningObjective, ObjectiveAssociation, ObjectiveEval, SaveOutcome, Section,
    SectionCoverage, SectionKey, TeachingAssignment,
};

// 引擎
pub use engine::{
    CoverageEngine, DuplicationPropagator, EvaluationSaveEngine, EvaluationSaveError,
    GradeThresholdFilter,
};

// API
pub use api::{ApiError, ApiResult, CurriculumEntryApi, EvaluationApi, QueryApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学位项目评估跟踪系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
