// ==========================================
// 学位项目评估跟踪系统 - 课程体系实体
// ==========================================
// 覆盖: degree / course / instructor / learning_objective
//       requires / associated / section / teaches
// 约束: 全部为显式字段类型，不允许以无类型 map 传递行数据
// ==========================================

use crate::domain::types::Term;
use serde::{Deserialize, Serialize};

// ==========================================
// 基础实体
// ==========================================

/// 学位（复合主键: 名称 + 层次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    pub degree_name: String,
    /// 层次: BA / BS / MS / PhD / Cert 等
    pub degree_level: String,
}

/// 课程
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_num: String,
    pub course_name: String,
}

/// 教师
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub instructor_id: String,
    pub instructor_name: String,
}

/// 学习目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub obj_code: String,
    pub title: String,
    pub description: Option<String>,
}

// ==========================================
// 关联关系
// ==========================================

/// 学位↔课程关联（requires 行）
///
/// `core` 标记该课程是否计入该学位的目标评估
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRequirement {
    pub degree_name: String,
    pub degree_level: String,
    pub course_num: String,
    pub core: bool,
}

/// 学位语境下课程↔学习目标关联（associated 行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveAssociation {
    pub degree_name: String,
    pub degree_level: String,
    pub course_num: String,
    pub obj_code: String,
}

// ==========================================
// 开课记录
// ==========================================

/// 开课班级复合主键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionKey {
    pub course_num: String,
    pub sec_num: String,
    pub term: Term,
    pub year: i32,
}

/// 开课班级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub course_num: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    /// 选课人数
    pub num_students: i32,
}

impl Section {
    pub fn key(&self) -> SectionKey {
        SectionKey {
            course_num: self.course_num.clone(),
            sec_num: self.sec_num.clone(),
            term: self.sec_term,
            year: self.sec_year,
        }
    }
}

/// 授课分配（teaches 行）。每个开课班级预期恰有一条。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingAssignment {
    pub course_num: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub instructor_id: String,
}
