// ==========================================
// 学位项目评估跟踪系统 - 评估保存引擎
// ==========================================
// 职责: 批次化的评估写入
//       选课人数校验 → 按复合主键插入或更新 → 跨学位复制
// 约束: 整个批次一个事务，任一校验/写入失败则全部回滚
// ==========================================

use crate::config::policy_trait::EvalPolicyReader;
use crate::domain::evaluation::{EvaluationBatch, ObjectiveEval, SaveOutcome};
use crate::domain::types::EnrollmentRule;
use crate::engine::duplication::DuplicationPropagator;
use crate::repository::error::RepositoryError;
use crate::repository::evaluation_repo::ObjectiveEvalRepository;
use crate::repository::section_repo::SectionRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::instrument;

// ==========================================
// 保存错误
// ==========================================
#[derive(Error, Debug)]
pub enum EvaluationSaveError {
    /// 成绩总数与选课人数不符（批次整体拒绝）
    #[error(
        "成绩数量校验失败: course={course_num}, section={sec_num}, \
         已录入 {entered} 份成绩, 选课人数为 {enrolled}"
    )]
    EnrollmentMismatch {
        course_num: String,
        sec_num: String,
        entered: i32,
        enrolled: i32,
    },

    #[error("策略配置读取失败: {0}")]
    Policy(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// EvaluationSaveEngine - 评估保存引擎
// ==========================================
pub struct EvaluationSaveEngine<C>
where
    C: EvalPolicyReader,
{
    conn: Arc<Mutex<Connection>>,
    policy: Arc<C>,
    propagator: DuplicationPropagator,
}

impl<C> EvaluationSaveEngine<C>
where
    C: EvalPolicyReader,
{
    /// 创建新的 EvaluationSaveEngine 实例
    ///
    /// # 参数
    /// - conn: 共享数据库连接
    /// - policy: 策略配置读取器
    pub fn new(conn: Arc<Mutex<Connection>>, policy: Arc<C>) -> Self {
        Self {
            conn,
            policy,
            propagator: DuplicationPropagator::new(),
        }
    }

    /// 保存一个评估批次
    ///
    /// 逐条处理:
    /// 1. 选课人数校验（班级存在时）: exact 策略要求成绩总数等于
    ///    num_students，allow_under 策略仅禁止超过
    /// 2. 按七列复合主键检查存在性，存在则原地更新，否则插入
    /// 3. duplicate 标记的条目向共享同一 (课程, 目标) 关联的
    ///    其他学位语境追加复制
    ///
    /// 全部读写在同一事务内；任一失败整批回滚。
    ///
    /// # 返回
    /// - Ok(SaveOutcome): 写入行数（原始条目 + 复制）
    /// - Err(EvaluationSaveError): 批次被拒绝，未发生任何写入
    #[instrument(skip(self, batch), fields(
        degree = %batch.degree_name,
        level = %batch.degree_level,
        term = %batch.term,
        year = batch.year,
        entries = batch.entries.len()
    ))]
    pub async fn save_batch(
        &self,
        batch: &EvaluationBatch,
    ) -> Result<SaveOutcome, EvaluationSaveError> {
        let enrollment_rule = self
            .policy
            .get_enrollment_rule()
            .await
            .map_err(|e| EvaluationSaveError::Policy(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut rows_written = 0usize;

        for entry in &batch.entries {
            let key = batch.eval_key(entry);

            // === 步骤 1: 选课人数校验 ===
            if let Some(section) = SectionRepository::find_on(&tx, &key.section_key())? {
                let entered = entry.values.total_entered();
                let rejected = match enrollment_rule {
                    EnrollmentRule::Exact => entered != section.num_students,
                    EnrollmentRule::AllowUnder => entered > section.num_students,
                };
                if rejected {
                    // 事务随错误返回被丢弃，之前条目的写入一并回滚
                    return Err(EvaluationSaveError::EnrollmentMismatch {
                        course_num: key.course_num,
                        sec_num: key.sec_num,
                        entered,
                        enrolled: section.num_students,
                    });
                }
            }

            // === 步骤 2: 按复合主键插入或更新 ===
            if ObjectiveEvalRepository::exists_on(&tx, &key)? {
                ObjectiveEvalRepository::update_on(&tx, &key, &entry.values)?;
            } else {
                ObjectiveEvalRepository::insert_on(
                    &tx,
                    &ObjectiveEval {
                        key: key.clone(),
                        values: entry.values.clone(),
                    },
                )?;
            }
            rows_written += 1;

            // === 步骤 3: 跨学位复制 ===
            if entry.duplicate {
                rows_written += self.propagator.propagate(&tx, &key, &entry.values)?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(rows_written, "评估批次保存完成");
        Ok(SaveOutcome { rows_written })
    }
}
