// ==========================================
// 学位项目评估跟踪系统 - 评估录入 API
// ==========================================
// 职责: 评估录入页的数据准备与保存入口
// 约束: `course|section|objective|field` 形式的表单编码
//       只在本层解码一次，引擎只接受类型化批次
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::policy_trait::EvalPolicyReader;
use crate::domain::curriculum::{Degree, Instructor, LearningObjective};
use crate::domain::evaluation::{
    EvalKey, EvalValues, EvaluationBatch, EvaluationEntry, ObjectiveEval, SaveOutcome,
};
use crate::domain::types::{current_semester, Term};
use crate::engine::saver::EvaluationSaveEngine;
use crate::repository::curriculum_repo::CurriculumRepository;
use crate::repository::evaluation_repo::ObjectiveEvalRepository;
use crate::repository::section_repo::SectionRepository;

// ==========================================
// DTO
// ==========================================

/// 评估选择页的数据源（学位 + 教师下拉框，带默认学期）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionOptions {
    pub degrees: Vec<Degree>,
    pub instructors: Vec<Instructor>,
    pub default_term: Term,
    pub default_year: i32,
}

/// 录入页中某个目标的条目（已有评估用于回填）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveEntryView {
    pub objective: LearningObjective,
    pub existing: Option<ObjectiveEval>,
}

/// 录入页中某个班级的条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEntryView {
    pub course_num: String,
    pub course_name: String,
    pub sec_num: String,
    pub objectives: Vec<ObjectiveEntryView>,
}

// ==========================================
// EvaluationApi - 评估录入 API
// ==========================================
pub struct EvaluationApi<C>
where
    C: EvalPolicyReader,
{
    curriculum_repo: Arc<CurriculumRepository>,
    section_repo: Arc<SectionRepository>,
    eval_repo: Arc<ObjectiveEvalRepository>,
    save_engine: Arc<EvaluationSaveEngine<C>>,
}

impl<C> EvaluationApi<C>
where
    C: EvalPolicyReader,
{
    /// 创建新的 EvaluationApi 实例
    pub fn new(
        curriculum_repo: Arc<CurriculumRepository>,
        section_repo: Arc<SectionRepository>,
        eval_repo: Arc<ObjectiveEvalRepository>,
        save_engine: Arc<EvaluationSaveEngine<C>>,
    ) -> Self {
        Self {
            curriculum_repo,
            section_repo,
            eval_repo,
            save_engine,
        }
    }

    /// 评估选择页数据源
    pub fn selection_options(&self) -> ApiResult<SelectionOptions> {
        let (default_term, default_year) = current_semester();
        Ok(SelectionOptions {
            degrees: self.curriculum_repo.list_degrees()?,
            instructors: self.curriculum_repo.list_instructors()?,
            default_term,
            default_year,
        })
    }

    /// 录入页数据: 某教师某学期所授班级，
    /// 各班级附上该学位语境下的目标及已有评估（回填）
    pub fn entry_view(
        &self,
        degree_name: &str,
        degree_level: &str,
        instructor_id: &str,
        term: Term,
        year: i32,
    ) -> ApiResult<Vec<SectionEntryView>> {
        if degree_name.is_empty() || degree_level.is_empty() || instructor_id.is_empty() {
            return Err(ApiError::InvalidInput(
                "学位、层次与教师为必选项".to_string(),
            ));
        }

        let sections = self
            .section_repo
            .find_taught_sections(instructor_id, term, year)?;

        let mut views = Vec::with_capacity(sections.len());
        for section in sections {
            let objectives = self.curriculum_repo.objectives_for_degree_course(
                degree_name,
                degree_level,
                &section.course_num,
            )?;

            let mut entries = Vec::with_capacity(objectives.len());
            for objective in objectives {
                let existing = self.eval_repo.find_by_key(&EvalKey {
                    sec_num: section.sec_num.clone(),
                    sec_term: term,
                    sec_year: year,
                    obj_code: objective.obj_code.clone(),
                    degree_name: degree_name.to_string(),
                    degree_level: degree_level.to_string(),
                    course_num: section.course_num.clone(),
                })?;
                entries.push(ObjectiveEntryView {
                    objective,
                    existing,
                });
            }

            views.push(SectionEntryView {
                course_num: section.course_num,
                course_name: section.course_name,
                sec_num: section.sec_num,
                objectives: entries,
            });
        }

        Ok(views)
    }

    /// 保存表单提交的评估批次
    ///
    /// 表单编码见 `parse_evaluation_form`；解码后的批次交给保存引擎，
    /// 整批一个事务。
    pub async fn save_from_form(&self, form: &HashMap<String, String>) -> ApiResult<SaveOutcome> {
        let batch = parse_evaluation_form(form)?;
        Ok(self.save_engine.save_batch(&batch).await?)
    }
}

// ==========================================
// 表单解码
// ==========================================

/// 把表单 map 解码为类型化评估批次
///
/// 编码约定:
/// - 上下文字段: degree_name / degree_level / sec_term / sec_year
/// - 条目字段: `course|section|objective|field`，
///   field ∈ {based_on, perform_a, perform_b, perform_c, perform_f,
///            improvements, duplicate}
/// - 仅当 `...|based_on` 键存在时，该 (课程, 班级, 目标) 才构成待保存条目
///
/// 成绩计数缺失/留空按 0 处理；非数字或负数是输入错误。
/// 条目按 (课程, 班级, 目标) 排序，保证批次处理顺序确定。
pub fn parse_evaluation_form(form: &HashMap<String, String>) -> ApiResult<EvaluationBatch> {
    let degree_name = require_field(form, "degree_name")?;
    let degree_level = require_field(form, "degree_level")?;

    let term_raw = require_field(form, "sec_term")?;
    let term = Term::from_db_str(&term_raw)
        .ok_or_else(|| ApiError::InvalidInput(format!("无法识别的学期: {}", term_raw)))?;

    let year_raw = require_field(form, "sec_year")?;
    let year: i32 = year_raw
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("年份必须是整数: {}", year_raw)))?;

    let mut entries = Vec::new();
    for (key, based_on) in form {
        let parts: Vec<&str> = key.split('|').collect();
        if parts.len() != 4 || parts[3] != "based_on" {
            continue;
        }
        let (course_num, sec_num, obj_code) = (parts[0], parts[1], parts[2]);
        let prefix = format!("{}|{}|{}|", course_num, sec_num, obj_code);

        let values = EvalValues {
            based_on: based_on.clone(),
            perform_a: parse_count(form, &prefix, "perform_a")?,
            perform_b: parse_count(form, &prefix, "perform_b")?,
            perform_c: parse_count(form, &prefix, "perform_c")?,
            perform_f: parse_count(form, &prefix, "perform_f")?,
            improvements: form
                .get(&format!("{}improvements", prefix))
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty()),
        };

        let duplicate = form
            .get(&format!("{}duplicate", prefix))
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "on" | "true" | "1" | "yes"
                )
            })
            .unwrap_or(false);

        entries.push(EvaluationEntry {
            course_num: course_num.to_string(),
            sec_num: sec_num.to_string(),
            obj_code: obj_code.to_string(),
            values,
            duplicate,
        });
    }

    entries.sort_by(|a, b| {
        (&a.course_num, &a.sec_num, &a.obj_code).cmp(&(&b.course_num, &b.sec_num, &b.obj_code))
    });

    Ok(EvaluationBatch {
        degree_name,
        degree_level,
        term,
        year,
        entries,
    })
}

/// 必填上下文字段
fn require_field(form: &HashMap<String, String>, name: &str) -> ApiResult<String> {
    match form.get(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::InvalidInput(format!("缺少必填字段: {}", name))),
    }
}

/// 解析成绩计数字段: 缺失/留空 → 0，非数字或负数 → 输入错误
fn parse_count(form: &HashMap<String, String>, prefix: &str, field: &str) -> ApiResult<i32> {
    let full_key = format!("{}{}", prefix, field);
    let raw = match form.get(&full_key) {
        None => return Ok(0),
        Some(v) if v.trim().is_empty() => return Ok(0),
        Some(v) => v.trim(),
    };
    let count: i32 = raw.parse().map_err(|_| {
        ApiError::InvalidInput(format!("成绩计数必须是整数: {}={}", full_key, raw))
    })?;
    if count < 0 {
        return Err(ApiError::InvalidInput(format!(
            "成绩计数不能为负数: {}={}",
            full_key, count
        )));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> HashMap<String, String> {
        let mut form = HashMap::new();
        form.insert("degree_name".to_string(), "Computer Science".to_string());
        form.insert("degree_level".to_string(), "BS".to_string());
        form.insert("sec_term".to_string(), "Fall".to_string());
        form.insert("sec_year".to_string(), "2025".to_string());
        form
    }

    #[test]
    fn test_parse_groups_fields_by_tuple_prefix() {
        let mut form = base_form();
        form.insert(
            "CSE2340|001|LO1|based_on".to_string(),
            "Final exam".to_string(),
        );
        form.insert("CSE2340|001|LO1|perform_a".to_string(), "10".to_string());
        form.insert("CSE2340|001|LO1|perform_b".to_string(), "12".to_string());
        form.insert("CSE2340|001|LO1|perform_c".to_string(), "6".to_string());
        form.insert("CSE2340|001|LO1|perform_f".to_string(), "2".to_string());
        form.insert(
            "CSE2340|001|LO1|improvements".to_string(),
            "More examples".to_string(),
        );
        form.insert("CSE2340|001|LO1|duplicate".to_string(), "on".to_string());

        let batch = parse_evaluation_form(&form).unwrap();
        assert_eq!(batch.degree_name, "Computer Science");
        assert_eq!(batch.term, Term::Fall);
        assert_eq!(batch.entries.len(), 1);

        let entry = &batch.entries[0];
        assert_eq!(entry.course_num, "CSE2340");
        assert_eq!(entry.sec_num, "001");
        assert_eq!(entry.obj_code, "LO1");
        assert_eq!(entry.values.based_on, "Final exam");
        assert_eq!(entry.values.total_entered(), 30);
        assert_eq!(entry.values.improvements.as_deref(), Some("More examples"));
        assert!(entry.duplicate);
    }

    #[test]
    fn test_tuple_without_based_on_is_not_submitted() {
        let mut form = base_form();
        // 只有成绩字段、没有 based_on 的组不构成条目
        form.insert("CSE2340|001|LO1|perform_a".to_string(), "30".to_string());

        let batch = parse_evaluation_form(&form).unwrap();
        assert!(batch.entries.is_empty());
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let mut form = base_form();
        form.insert("CSE2340|001|LO1|based_on".to_string(), "Quiz".to_string());
        form.insert("CSE2340|001|LO1|perform_a".to_string(), "".to_string());

        let batch = parse_evaluation_form(&form).unwrap();
        let entry = &batch.entries[0];
        assert_eq!(entry.values.total_entered(), 0);
        assert!(!entry.duplicate);
        assert!(entry.values.improvements.is_none());
    }

    #[test]
    fn test_malformed_count_is_input_error() {
        let mut form = base_form();
        form.insert("CSE2340|001|LO1|based_on".to_string(), "Quiz".to_string());
        form.insert(
            "CSE2340|001|LO1|perform_a".to_string(),
            "twelve".to_string(),
        );

        let err = parse_evaluation_form(&form).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_negative_count_is_input_error() {
        let mut form = base_form();
        form.insert("CSE2340|001|LO1|based_on".to_string(), "Quiz".to_string());
        form.insert("CSE2340|001|LO1|perform_f".to_string(), "-1".to_string());

        assert!(parse_evaluation_form(&form).is_err());
    }

    #[test]
    fn test_missing_context_field_is_input_error() {
        let mut form = base_form();
        form.remove("sec_term");
        let err = parse_evaluation_form(&form).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_term_is_input_error() {
        let mut form = base_form();
        form.insert("sec_term".to_string(), "Winter".to_string());
        assert!(parse_evaluation_form(&form).is_err());
    }

    #[test]
    fn test_entries_sorted_by_course_section_objective() {
        let mut form = base_form();
        form.insert("CSE5340|001|LO1|based_on".to_string(), "Exam".to_string());
        form.insert("CSE2340|002|LO2|based_on".to_string(), "Exam".to_string());
        form.insert("CSE2340|002|LO1|based_on".to_string(), "Exam".to_string());

        let batch = parse_evaluation_form(&form).unwrap();
        let order: Vec<(&str, &str, &str)> = batch
            .entries
            .iter()
            .map(|e| {
                (
                    e.course_num.as_str(),
                    e.sec_num.as_str(),
                    e.obj_code.as_str(),
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![
                ("CSE2340", "002", "LO1"),
                ("CSE2340", "002", "LO2"),
                ("CSE5340", "001", "LO1"),
            ]
        );
    }
}
