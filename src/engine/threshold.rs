// ==========================================
// 学位项目评估跟踪系统 - 成绩百分比过滤引擎
// ==========================================
// 职责: 筛选某学期内非 F 成绩数达到选课人数指定比例的评估行
// 约束: 每条评估行独立判定，不跨行聚合；
//       同一班级可因多条达标目标评估重复出现
// ==========================================

use crate::domain::types::Term;
use crate::repository::error::RepositoryResult;
use crate::repository::evaluation_repo::{ObjectiveEvalRepository, SemesterEvalRow};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// GradeThresholdFilter - 成绩百分比过滤引擎
// ==========================================
pub struct GradeThresholdFilter {
    eval_repo: Arc<ObjectiveEvalRepository>,
}

impl GradeThresholdFilter {
    /// 创建新的 GradeThresholdFilter 实例
    pub fn new(eval_repo: Arc<ObjectiveEvalRepository>) -> Self {
        Self { eval_repo }
    }

    /// 筛选达标评估行
    ///
    /// 判定: non_f = perform_a + perform_b + perform_c，
    ///       保留 non_f >= num_students * fraction 的行
    ///
    /// # 参数
    /// - term / year: 学期
    /// - fraction: 比例阈值（0.0 ~ 1.0，由 API 层从百分比换算并校验）
    ///
    /// # 返回
    /// - Ok(Vec<SemesterEvalRow>): 按课程、班级、学位、目标、评估依据排序
    #[instrument(skip(self), fields(term = %term, year = year, fraction = fraction))]
    pub fn sections_meeting_threshold(
        &self,
        term: Term,
        year: i32,
        fraction: f64,
    ) -> RepositoryResult<Vec<SemesterEvalRow>> {
        let mut rows = self.eval_repo.semester_rows(term, year)?;

        rows.retain(|row| {
            f64::from(row.non_failing()) >= f64::from(row.num_students) * fraction
        });

        rows.sort_by(|a, b| {
            (
                &a.course_num,
                &a.sec_num,
                &a.degree_name,
                &a.degree_level,
                &a.obj_code,
                &a.based_on,
            )
                .cmp(&(
                    &b.course_num,
                    &b.sec_num,
                    &b.degree_name,
                    &b.degree_level,
                    &b.obj_code,
                    &b.based_on,
                ))
        });

        Ok(rows)
    }
}
