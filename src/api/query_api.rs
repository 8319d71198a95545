// ==========================================
// 学位项目评估跟踪系统 - 查询 API
// ==========================================
// 职责: 学位/课程/教师视角的目录查询，
//       评估覆盖状态报表与成绩百分比过滤报表
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::curriculum::{LearningObjective, ObjectiveAssociation};
use crate::domain::evaluation::SectionCoverage;
use crate::domain::types::Term;
use crate::engine::coverage::CoverageEngine;
use crate::engine::threshold::GradeThresholdFilter;
use crate::repository::curriculum_repo::{CurriculumRepository, DegreeCourseRow};
use crate::repository::evaluation_repo::SemesterEvalRow;
use crate::repository::section_repo::{
    CourseSectionRow, DegreeSectionRow, InstructorSectionRow, SectionRepository,
};

// ==========================================
// DTO
// ==========================================

/// 学位详情: 课程清单（core 优先）、目标清单、(目标, 课程) 关联对
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeDetails {
    pub degree_name: String,
    pub degree_level: String,
    pub courses: Vec<DegreeCourseRow>,
    pub objectives: Vec<LearningObjective>,
    pub links: Vec<ObjectiveAssociation>,
}

// ==========================================
// QueryApi - 查询 API
// ==========================================
pub struct QueryApi {
    curriculum_repo: Arc<CurriculumRepository>,
    section_repo: Arc<SectionRepository>,
    coverage_engine: Arc<CoverageEngine>,
    threshold_filter: Arc<GradeThresholdFilter>,
}

impl QueryApi {
    /// 创建新的 QueryApi 实例
    pub fn new(
        curriculum_repo: Arc<CurriculumRepository>,
        section_repo: Arc<SectionRepository>,
        coverage_engine: Arc<CoverageEngine>,
        threshold_filter: Arc<GradeThresholdFilter>,
    ) -> Self {
        Self {
            curriculum_repo,
            section_repo,
            coverage_engine,
            threshold_filter,
        }
    }

    // ==========================================
    // 目录查询
    // ==========================================

    /// 学位详情
    pub fn degree_details(&self, degree_name: &str, degree_level: &str) -> ApiResult<DegreeDetails> {
        Ok(DegreeDetails {
            degree_name: degree_name.to_string(),
            degree_level: degree_level.to_string(),
            courses: self
                .curriculum_repo
                .degree_courses(degree_name, degree_level)?,
            objectives: self
                .curriculum_repo
                .degree_objectives(degree_name, degree_level)?,
            links: self
                .curriculum_repo
                .degree_associations(degree_name, degree_level)?,
        })
    }

    /// 学位课程在年度区间内的开课记录（时间序）
    pub fn degree_sections(
        &self,
        degree_name: &str,
        degree_level: &str,
        start_year: i32,
        end_year: i32,
    ) -> ApiResult<Vec<DegreeSectionRow>> {
        validate_year_range(start_year, end_year)?;
        Ok(self
            .section_repo
            .find_degree_sections(degree_name, degree_level, start_year, end_year)?)
    }

    /// 单门课程在年度区间内的开课记录（时间序）
    pub fn course_sections(
        &self,
        course_num: &str,
        start_year: i32,
        end_year: i32,
    ) -> ApiResult<Vec<CourseSectionRow>> {
        validate_year_range(start_year, end_year)?;
        Ok(self
            .section_repo
            .find_course_sections(course_num, start_year, end_year)?)
    }

    /// 某教师在年度区间内授过的班级（时间序）
    pub fn instructor_sections(
        &self,
        instructor_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> ApiResult<Vec<InstructorSectionRow>> {
        validate_year_range(start_year, end_year)?;
        Ok(self
            .section_repo
            .find_instructor_sections(instructor_id, start_year, end_year)?)
    }

    // ==========================================
    // 评估报表
    // ==========================================

    /// 某学期全部班级的评估覆盖状态
    pub fn evaluation_status(&self, term: Term, year: i32) -> ApiResult<Vec<SectionCoverage>> {
        Ok(self.coverage_engine.semester_coverage(term, year)?)
    }

    /// 成绩百分比过滤: 非 F 成绩数达到选课人数 percentage% 的评估行
    ///
    /// # 参数
    /// - percentage: 原始字符串（0~100）；非数字或越界是输入错误
    pub fn grade_threshold(
        &self,
        term: Term,
        year: i32,
        percentage: &str,
    ) -> ApiResult<Vec<SemesterEvalRow>> {
        let p: f64 = percentage.trim().parse().map_err(|_| {
            ApiError::InvalidInput(format!("百分比必须是数字: {}", percentage))
        })?;
        if !(0.0..=100.0).contains(&p) {
            return Err(ApiError::InvalidInput(format!(
                "百分比必须在 0~100 之间: {}",
                p
            )));
        }

        Ok(self
            .threshold_filter
            .sections_meeting_threshold(term, year, p / 100.0)?)
    }
}

/// 年度区间检查
fn validate_year_range(start_year: i32, end_year: i32) -> ApiResult<()> {
    if start_year > end_year {
        return Err(ApiError::InvalidInput(format!(
            "起始年份不能晚于结束年份: {} > {}",
            start_year, end_year
        )));
    }
    Ok(())
}
