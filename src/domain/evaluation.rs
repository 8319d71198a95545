// ==========================================
// 学位项目评估跟踪系统 - 评估记录实体
// ==========================================
// objective_eval 行的结构化表示:
// 七列复合主键 (EvalKey) + 五个可变属性 (EvalValues)
// ==========================================

use crate::domain::curriculum::SectionKey;
use crate::domain::types::{CoverageStatus, Term};
use serde::{Deserialize, Serialize};

// ==========================================
// EvalKey - 评估记录复合主键
// ==========================================
/// (sec_num, sec_term, sec_year, obj_code, degree_name, degree_level, course_num)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvalKey {
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub obj_code: String,
    pub degree_name: String,
    pub degree_level: String,
    pub course_num: String,
}

impl EvalKey {
    /// 所属开课班级的主键
    pub fn section_key(&self) -> SectionKey {
        SectionKey {
            course_num: self.course_num.clone(),
            sec_num: self.sec_num.clone(),
            term: self.sec_term,
            year: self.sec_year,
        }
    }

    /// 同一开课班级/目标，换一个学位语境后的主键（用于跨学位复制）
    pub fn for_degree(&self, degree_name: &str, degree_level: &str) -> EvalKey {
        EvalKey {
            degree_name: degree_name.to_string(),
            degree_level: degree_level.to_string(),
            ..self.clone()
        }
    }
}

// ==========================================
// EvalValues - 评估记录可变属性
// ==========================================
/// 更新操作只触及这五个字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalValues {
    /// 评估依据（作业/考试等测评手段的描述）
    pub based_on: String,
    pub perform_a: i32,
    pub perform_b: i32,
    pub perform_c: i32,
    pub perform_f: i32,
    /// 改进措施叙述（可选）
    pub improvements: Option<String>,
}

impl EvalValues {
    /// 已录入成绩总数 (A+B+C+F)
    pub fn total_entered(&self) -> i32 {
        self.perform_a + self.perform_b + self.perform_c + self.perform_f
    }

    /// 非 F 成绩数 (A+B+C)
    pub fn non_failing(&self) -> i32 {
        self.perform_a + self.perform_b + self.perform_c
    }
}

/// 一条目标评估记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveEval {
    pub key: EvalKey,
    pub values: EvalValues,
}

// ==========================================
// 保存批次
// ==========================================

/// 单条待保存评估（表单解码后的类型化形式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationEntry {
    pub course_num: String,
    pub sec_num: String,
    pub obj_code: String,
    pub values: EvalValues,
    /// 复制到共享同一课程/目标关联的其他学位语境
    pub duplicate: bool,
}

/// 一次保存请求的完整批次（学位/学期上下文 + 条目）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationBatch {
    pub degree_name: String,
    pub degree_level: String,
    pub term: Term,
    pub year: i32,
    pub entries: Vec<EvaluationEntry>,
}

impl EvaluationBatch {
    /// 条目在本批次上下文中的评估主键
    pub fn eval_key(&self, entry: &EvaluationEntry) -> EvalKey {
        EvalKey {
            sec_num: entry.sec_num.clone(),
            sec_term: self.term,
            sec_year: self.year,
            obj_code: entry.obj_code.clone(),
            degree_name: self.degree_name.clone(),
            degree_level: self.degree_level.clone(),
            course_num: entry.course_num.clone(),
        }
    }
}

/// 保存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    /// 写入的评估行数（原始条目 + 跨学位复制）
    pub rows_written: usize,
}

// ==========================================
// 覆盖状态报表 DTO
// ==========================================

/// 某开课班级在单个学位语境下的覆盖情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeCoverage {
    pub degree_name: String,
    pub degree_level: String,
    pub status: CoverageStatus,
    /// 该 (班级, 学位) 下是否存在非空改进叙述
    pub improvements_present: bool,
}

/// 某学期单个开课班级的覆盖报表行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCoverage {
    pub course_num: String,
    pub course_name: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub num_students: i32,
    pub instructor_name: Option<String>,
    /// 每个以 core 要求此课程的学位一条
    pub degrees: Vec<DegreeCoverage>,
}
