// ==========================================
// 学位项目评估跟踪系统 - 领域层
// ==========================================
// 职责: 实体与类型定义
// 红线: 领域类型不做数据库访问
// ==========================================

pub mod curriculum;
pub mod evaluation;
pub mod types;

// 重导出核心实体
pub use curriculum::{
    Course, CourseRequirement, Degree, Instructor, LearningObjective, ObjectiveAssociation,
    Section, SectionKey, TeachingAssignment,
};
pub use evaluation::{
    DegreeCoverage, EvalKey, EvalValues, EvaluationBatch, EvaluationEntry, ObjectiveEval,
    SaveOutcome, SectionCoverage,
};
pub use types::{current_semester, AssociationRule, CoverageStatus, EnrollmentRule, Term};
