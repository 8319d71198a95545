// ==========================================
// 学位项目评估跟踪系统 - 领域类型定义
// ==========================================
// 覆盖: 学期、覆盖状态、校验策略
// ==========================================

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 学期 (Term)
// ==========================================
// 学年内顺序: Spring < Summer < Fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Spring,
    Summer,
    Fall,
}

impl Term {
    /// 全部学期，按学年内顺序
    pub const ALL: [Term; 3] = [Term::Spring, Term::Summer, Term::Fall];

    /// 数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Term::Spring => "Spring",
            Term::Summer => "Summer",
            Term::Fall => "Fall",
        }
    }

    /// 从数据库/表单字符串解析
    pub fn from_db_str(s: &str) -> Option<Term> {
        match s.trim() {
            "Spring" => Some(Term::Spring),
            "Summer" => Some(Term::Summer),
            "Fall" => Some(Term::Fall),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 按当前日期推算默认学期（1-4 月 Spring, 5-7 月 Summer, 8-12 月 Fall）
pub fn current_semester() -> (Term, i32) {
    let today = chrono::Local::now().date_naive();
    let term = match today.month() {
        1..=4 => Term::Spring,
        5..=7 => Term::Summer,
        _ => Term::Fall,
    };
    (term, today.year())
}

// ==========================================
// 覆盖状态 (Coverage Status)
// ==========================================
// 某开课班级在某学位语境下，预期目标评估与已录入评估的对比结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    /// 未录入（无论是否配置了目标）
    NotEntered,
    /// 已有数据但未配置任何目标（异常标记）
    DataExistsNoObjectives,
    /// 全部录入
    FullyEntered,
    /// 部分录入
    PartiallyEntered { entered: i64, expected: i64 },
}

impl CoverageStatus {
    /// 状态判定规则:
    /// - expected == 0 且 entered == 0 → NotEntered
    /// - expected == 0 且 entered > 0  → DataExistsNoObjectives
    /// - entered == expected > 0       → FullyEntered
    /// - 其余 entered > 0              → PartiallyEntered
    /// - entered == 0, expected > 0    → NotEntered
    pub fn derive(expected: i64, entered: i64) -> CoverageStatus {
        if expected > 0 {
            if entered == expected {
                CoverageStatus::FullyEntered
            } else if entered > 0 {
                CoverageStatus::PartiallyEntered { entered, expected }
            } else {
                CoverageStatus::NotEntered
            }
        } else if entered > 0 {
            CoverageStatus::DataExistsNoObjectives
        } else {
            CoverageStatus::NotEntered
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageStatus::NotEntered => write!(f, "Not Entered"),
            CoverageStatus::DataExistsNoObjectives => write!(f, "Data Exists (No Objectives Set)"),
            CoverageStatus::FullyEntered => write!(f, "Fully Entered"),
            CoverageStatus::PartiallyEntered { entered, expected } => {
                write!(f, "Partially Entered ({}/{})", entered, expected)
            }
        }
    }
}

// ==========================================
// 目标关联前置策略 (Association Rule)
// ==========================================
// 创建 associated 链接前，requires 表需要满足的条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationRule {
    /// 课程必须已被该学位设为 core（默认，最严格）
    RequireCore,
    /// 课程必须已被该学位引用（core 与否不限）
    RequireLink,
    /// 不做前置检查
    Unchecked,
}

impl AssociationRule {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssociationRule::RequireCore => "require_core",
            AssociationRule::RequireLink => "require_link",
            AssociationRule::Unchecked => "none",
        }
    }

    pub fn from_db_str(s: &str) -> Option<AssociationRule> {
        match s.trim() {
            "require_core" => Some(AssociationRule::RequireCore),
            "require_link" => Some(AssociationRule::RequireLink),
            "none" => Some(AssociationRule::Unchecked),
            _ => None,
        }
    }
}

// ==========================================
// 选课人数校验策略 (Enrollment Rule)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentRule {
    /// 各档成绩数之和必须等于选课人数（默认）
    Exact,
    /// 仅禁止超过选课人数（历史宽松行为）
    AllowUnder,
}

impl EnrollmentRule {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EnrollmentRule::Exact => "exact",
            EnrollmentRule::AllowUnder => "allow_under",
        }
    }

    pub fn from_db_str(s: &str) -> Option<EnrollmentRule> {
        match s.trim() {
            "exact" => Some(EnrollmentRule::Exact),
            "allow_under" => Some(EnrollmentRule::AllowUnder),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_order_is_chronological() {
        assert!(Term::Spring < Term::Summer);
        assert!(Term::Summer < Term::Fall);
    }

    #[test]
    fn test_term_db_roundtrip() {
        for term in Term::ALL {
            assert_eq!(Term::from_db_str(term.to_db_str()), Some(term));
        }
        assert_eq!(Term::from_db_str("Winter"), None);
        assert_eq!(Term::from_db_str(" Fall "), Some(Term::Fall));
    }

    #[test]
    fn test_coverage_status_derivation() {
        assert_eq!(CoverageStatus::derive(0, 0), CoverageStatus::NotEntered);
        assert_eq!(
            CoverageStatus::derive(0, 2),
            CoverageStatus::DataExistsNoObjectives
        );
        assert_eq!(CoverageStatus::derive(3, 3), CoverageStatus::FullyEntered);
        assert_eq!(
            CoverageStatus::derive(3, 1),
            CoverageStatus::PartiallyEntered {
                entered: 1,
                expected: 3
            }
        );
        assert_eq!(CoverageStatus::derive(3, 0), CoverageStatus::NotEntered);
    }

    #[test]
    fn test_coverage_status_display() {
        assert_eq!(CoverageStatus::derive(3, 0).to_string(), "Not Entered");
        assert_eq!(
            CoverageStatus::derive(3, 2).to_string(),
            "Partially Entered (2/3)"
        );
        assert_eq!(CoverageStatus::derive(3, 3).to_string(), "Fully Entered");
        assert_eq!(
            CoverageStatus::derive(0, 1).to_string(),
            "Data Exists (No Objectives Set)"
        );
    }

    #[test]
    fn test_policy_parse_fallbacks() {
        assert_eq!(
            AssociationRule::from_db_str("require_core"),
            Some(AssociationRule::RequireCore)
        );
        assert_eq!(AssociationRule::from_db_str("bogus"), None);
        assert_eq!(
            EnrollmentRule::from_db_str("allow_under"),
            Some(EnrollmentRule::AllowUnder)
        );
        assert_eq!(EnrollmentRule::from_db_str(""), None);
    }
}
