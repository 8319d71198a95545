// ==========================================
// 学位项目评估跟踪系统 - 覆盖计算引擎
// ==========================================
// 职责: 按学期汇总每个开课班级、每个学位语境下
//       预期/已录入的目标评估数，推导覆盖状态
// 输入: section + requires + associated + objective_eval
// 输出: SectionCoverage 报表行（只读，无副作用）
// ==========================================

use crate::domain::evaluation::{DegreeCoverage, SectionCoverage};
use crate::domain::types::{CoverageStatus, Term};
use crate::repository::curriculum_repo::CurriculumRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::evaluation_repo::ObjectiveEvalRepository;
use crate::repository::section_repo::SectionRepository;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// CoverageEngine - 覆盖计算引擎
// ==========================================
pub struct CoverageEngine {
    section_repo: Arc<SectionRepository>,
    curriculum_repo: Arc<CurriculumRepository>,
    eval_repo: Arc<ObjectiveEvalRepository>,
}

impl CoverageEngine {
    /// 创建新的 CoverageEngine 实例
    pub fn new(
        section_repo: Arc<SectionRepository>,
        curriculum_repo: Arc<CurriculumRepository>,
        eval_repo: Arc<ObjectiveEvalRepository>,
    ) -> Self {
        Self {
            section_repo,
            curriculum_repo,
            eval_repo,
        }
    }

    /// 计算某学期全部开课班级的评估覆盖状态
    ///
    /// 每个班级下，逐一处理以 core 要求其课程的学位:
    /// - expected: 该 (学位, 课程) 下已配置的目标数
    /// - entered:  该 (班级, 学位, 课程) 下已录入的评估数
    /// - improved: 其中含非空改进叙述的评估数
    ///
    /// # 返回
    /// - Ok(Vec<SectionCoverage>): 每个班级一条，内嵌各学位的状态
    #[instrument(skip(self), fields(term = %term, year = year))]
    pub fn semester_coverage(
        &self,
        term: Term,
        year: i32,
    ) -> RepositoryResult<Vec<SectionCoverage>> {
        let offerings = self.section_repo.find_semester_offerings(term, year)?;
        let mut report = Vec::with_capacity(offerings.len());

        for offering in offerings {
            let expectations = self
                .curriculum_repo
                .core_degree_expectations(&offering.course_num)?;

            let mut degrees = Vec::with_capacity(expectations.len());
            for expectation in expectations {
                let (entered, improved) = self.eval_repo.coverage_counts(
                    &offering.sec_num,
                    term,
                    year,
                    &offering.course_num,
                    &expectation.degree_name,
                    &expectation.degree_level,
                )?;

                degrees.push(DegreeCoverage {
                    degree_name: expectation.degree_name,
                    degree_level: expectation.degree_level,
                    status: CoverageStatus::derive(expectation.expected, entered),
                    improvements_present: improved > 0,
                });
            }

            report.push(SectionCoverage {
                course_num: offering.course_num,
                course_name: offering.course_name,
                sec_num: offering.sec_num,
                sec_term: offering.sec_term,
                sec_year: offering.sec_year,
                num_students: offering.num_students,
                instructor_name: offering.instructor_name,
                degrees,
            });
        }

        Ok(report)
    }
}
