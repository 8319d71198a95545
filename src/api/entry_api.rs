// ==========================================
// 学位项目评估跟踪系统 - 基础数据录入 API
// ==========================================
// 职责: 学位/课程/教师/目标的新增，课程/目标的关联，班级开设
// 约束: 目标关联受 association_rule 策略门控
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::policy_trait::EvalPolicyReader;
use crate::domain::curriculum::{
    Course, CourseRequirement, Degree, Instructor, LearningObjective, ObjectiveAssociation,
    Section,
};
use crate::domain::types::AssociationRule;
use crate::repository::curriculum_repo::CurriculumRepository;
use crate::repository::section_repo::SectionRepository;

// ==========================================
// CurriculumEntryApi - 基础数据录入 API
// ==========================================
pub struct CurriculumEntryApi<C>
where
    C: EvalPolicyReader,
{
    curriculum_repo: Arc<CurriculumRepository>,
    section_repo: Arc<SectionRepository>,
    policy: Arc<C>,
}

impl<C> CurriculumEntryApi<C>
where
    C: EvalPolicyReader,
{
    /// 创建新的 CurriculumEntryApi 实例
    pub fn new(
        curriculum_repo: Arc<CurriculumRepository>,
        section_repo: Arc<SectionRepository>,
        policy: Arc<C>,
    ) -> Self {
        Self {
            curriculum_repo,
            section_repo,
            policy,
        }
    }

    // ==========================================
    // 基础实体录入
    // ==========================================

    /// 新增学位
    pub fn add_degree(&self, degree_name: &str, degree_level: &str) -> ApiResult<()> {
        if degree_name.trim().is_empty() || degree_level.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "学位名称与层次不能为空".to_string(),
            ));
        }
        self.curriculum_repo.insert_degree(&Degree {
            degree_name: degree_name.trim().to_string(),
            degree_level: degree_level.trim().to_string(),
        })?;
        info!(degree = degree_name, level = degree_level, "新增学位");
        Ok(())
    }

    /// 新增课程
    pub fn add_course(&self, course_num: &str, course_name: &str) -> ApiResult<()> {
        if course_num.trim().is_empty() || course_name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "课程号与课程名不能为空".to_string(),
            ));
        }
        self.curriculum_repo.insert_course(&Course {
            course_num: course_num.trim().to_string(),
            course_name: course_name.trim().to_string(),
        })?;
        info!(course = course_num, "新增课程");
        Ok(())
    }

    /// 新增教师
    pub fn add_instructor(&self, instructor_id: &str, instructor_name: &str) -> ApiResult<()> {
        if instructor_id.trim().is_empty() || instructor_name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "教师编号与姓名不能为空".to_string(),
            ));
        }
        self.curriculum_repo.insert_instructor(&Instructor {
            instructor_id: instructor_id.trim().to_string(),
            instructor_name: instructor_name.trim().to_string(),
        })?;
        info!(instructor = instructor_id, "新增教师");
        Ok(())
    }

    /// 新增学习目标
    pub fn add_objective(
        &self,
        obj_code: &str,
        title: &str,
        description: Option<&str>,
    ) -> ApiResult<()> {
        if obj_code.trim().is_empty() || title.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "目标编码与标题不能为空".to_string(),
            ));
        }
        self.curriculum_repo.insert_objective(&LearningObjective {
            obj_code: obj_code.trim().to_string(),
            title: title.trim().to_string(),
            description: description.map(|d| d.to_string()),
        })?;
        info!(objective = obj_code, "新增学习目标");
        Ok(())
    }

    // ==========================================
    // 关联录入
    // ==========================================

    /// 课程↔学位关联（requires 行，含 core 标记）
    pub fn require_course(
        &self,
        degree_name: &str,
        degree_level: &str,
        course_num: &str,
        core: bool,
    ) -> ApiResult<()> {
        self.curriculum_repo
            .link_required_course(&CourseRequirement {
                degree_name: degree_name.to_string(),
                degree_level: degree_level.to_string(),
                course_num: course_num.to_string(),
                core,
            })?;
        info!(
            degree = degree_name,
            level = degree_level,
            course = course_num,
            core,
            "课程关联到学位"
        );
        Ok(())
    }

    /// 班级开设（section + teaches，同一事务）
    pub fn offer_section(&self, section: &Section, instructor_id: &str) -> ApiResult<()> {
        if section.num_students < 0 {
            return Err(ApiError::InvalidInput(format!(
                "选课人数不能为负数: {}",
                section.num_students
            )));
        }
        self.section_repo.offer(section, instructor_id)?;
        info!(
            course = %section.course_num,
            section = %section.sec_num,
            term = %section.sec_term,
            year = section.sec_year,
            instructor = instructor_id,
            "开设班级"
        );
        Ok(())
    }

    /// 学位语境下课程↔目标关联（associated 行）
    ///
    /// 按 association_rule 策略做前置检查:
    /// - require_core: requires 行必须存在且 core = true
    /// - require_link: requires 行必须存在
    /// - none: 不检查
    pub async fn link_objective(
        &self,
        degree_name: &str,
        degree_level: &str,
        course_num: &str,
        obj_code: &str,
    ) -> ApiResult<()> {
        let rule = self
            .policy
            .get_association_rule()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        match rule {
            AssociationRule::RequireCore | AssociationRule::RequireLink => {
                let requirement = self
                    .curriculum_repo
                    .find_requirement(degree_name, degree_level, course_num)?;
                match requirement {
                    None => {
                        return Err(ApiError::BusinessRuleViolation(format!(
                            "课程 {} 尚未关联到学位 {} ({})，不能建立目标关联",
                            course_num, degree_name, degree_level
                        )));
                    }
                    Some(req) if rule == AssociationRule::RequireCore && !req.core => {
                        return Err(ApiError::BusinessRuleViolation(format!(
                            "课程 {} 未被学位 {} ({}) 设为 core，不能建立目标关联",
                            course_num, degree_name, degree_level
                        )));
                    }
                    Some(_) => {}
                }
            }
            AssociationRule::Unchecked => {}
        }

        self.curriculum_repo.link_objective(&ObjectiveAssociation {
            degree_name: degree_name.to_string(),
            degree_level: degree_level.to_string(),
            course_num: course_num.to_string(),
            obj_code: obj_code.to_string(),
        })?;
        info!(
            degree = degree_name,
            level = degree_level,
            course = course_num,
            objective = obj_code,
            "目标关联到课程"
        );
        Ok(())
    }

    // ==========================================
    // 表单数据源查询
    // ==========================================

    /// 学位下拉框
    pub fn list_degrees(&self) -> ApiResult<Vec<Degree>> {
        Ok(self.curriculum_repo.list_degrees()?)
    }

    /// 课程下拉框
    pub fn list_courses(&self) -> ApiResult<Vec<Course>> {
        Ok(self.curriculum_repo.list_courses()?)
    }

    /// 教师下拉框
    pub fn list_instructors(&self) -> ApiResult<Vec<Instructor>> {
        Ok(self.curriculum_repo.list_instructors()?)
    }

    /// 学习目标下拉框
    pub fn list_objectives(&self) -> ApiResult<Vec<LearningObjective>> {
        Ok(self.curriculum_repo.list_objectives()?)
    }

    /// 目标关联表单的课程下拉框（仅 core 课程）
    pub fn list_core_courses(&self) -> ApiResult<Vec<Course>> {
        Ok(self.curriculum_repo.list_core_courses()?)
    }
}
