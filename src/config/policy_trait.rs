// ==========================================
// 学位项目评估跟踪系统 - 策略配置读取 Trait
// ==========================================
// 职责: 定义评估引擎所需的策略读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{AssociationRule, EnrollmentRule};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EvalPolicyReader Trait
// ==========================================
// 用途: 评估录入/关联创建所需的策略读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EvalPolicyReader: Send + Sync {
    /// 获取目标关联前置策略
    ///
    /// # 返回
    /// - AssociationRule::RequireCore: 课程必须已被该学位设为 core
    /// - AssociationRule::RequireLink: 课程必须已被该学位引用
    /// - AssociationRule::Unchecked: 不做前置检查
    ///
    /// # 默认值
    /// - require_core
    async fn get_association_rule(&self) -> Result<AssociationRule, Box<dyn Error>>;

    /// 获取选课人数校验策略
    ///
    /// # 返回
    /// - EnrollmentRule::Exact: 成绩总数必须等于选课人数
    /// - EnrollmentRule::AllowUnder: 仅禁止超过选课人数
    ///
    /// # 默认值
    /// - exact
    async fn get_enrollment_rule(&self) -> Result<EnrollmentRule, Box<dyn Error>>;
}
