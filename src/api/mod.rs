// ==========================================
// 学位项目评估跟踪系统 - API 层
// ==========================================
// 职责: 面向外部调用方的业务接口
//       输入校验、表单解码、错误转换
// ==========================================

pub mod entry_api;
pub mod error;
pub mod evaluation_api;
pub mod query_api;

// 重导出核心 API
pub use entry_api::CurriculumEntryApi;
pub use error::{ApiError, ApiResult};
pub use evaluation_api::{
    parse_evaluation_form, EvaluationApi, ObjectiveEntryView, SectionEntryView, SelectionOptions,
};
pub use query_api::{DegreeDetails, QueryApi};
