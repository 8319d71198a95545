// ==========================================
// 学位项目评估跟踪系统 - 引擎层
// ==========================================
// 职责: 实现评估业务规则,不拼 SQL
// 红线: Engine 不拼 SQL, 校验失败必须带出具体字段值
// ==========================================

pub mod coverage;
pub mod duplication;
pub mod saver;
pub mod threshold;

// 重导出核心引擎
pub use coverage::CoverageEngine;
pub use duplication::DuplicationPropagator;
pub use saver::{EvaluationSaveEngine, EvaluationSaveError};
pub use threshold::GradeThresholdFilter;
