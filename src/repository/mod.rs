// ==========================================
// 学位项目评估跟踪系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod curriculum_repo;
pub mod error;
pub mod evaluation_repo;
pub mod section_repo;

// 重导出核心仓储
pub use curriculum_repo::{CurriculumRepository, DegreeCourseRow, DegreeExpectation};
pub use error::{RepositoryError, RepositoryResult};
pub use evaluation_repo::{ObjectiveEvalRepository, SemesterEvalRow};
pub use section_repo::{
    CourseSectionRow, DegreeSectionRow, InstructorSectionRow, SectionOffering, SectionRepository,
    TaughtSectionRow,
};
