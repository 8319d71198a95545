// ==========================================
// 学位项目评估跟踪系统 - 跨学位复制传播器
// ==========================================
// 职责: 把一条已录入评估复制到共享同一 (课程, 目标)
//       关联的其他学位语境
// 约束: 只增不改，目标语境已有评估时跳过，绝不覆盖
// 说明: 在调用方（保存引擎）的批次事务内执行
// ==========================================

use crate::domain::evaluation::{EvalKey, EvalValues, ObjectiveEval};
use crate::repository::curriculum_repo::CurriculumRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::evaluation_repo::ObjectiveEvalRepository;
use rusqlite::Connection;

// ==========================================
// DuplicationPropagator - 跨学位复制传播器
// ==========================================
#[derive(Debug, Default)]
pub struct DuplicationPropagator;

impl DuplicationPropagator {
    pub fn new() -> Self {
        Self
    }

    /// 把 (source, values) 复制到其他学位语境，返回实际插入的行数
    ///
    /// # 参数
    /// - conn: 批次事务（Transaction 解引用为 Connection）
    /// - source: 已写入评估的复合主键
    /// - values: 被复制的五个可变属性
    pub fn propagate(
        &self,
        conn: &Connection,
        source: &EvalKey,
        values: &EvalValues,
    ) -> RepositoryResult<usize> {
        let targets = CurriculumRepository::degrees_sharing_objective(
            conn,
            &source.course_num,
            &source.obj_code,
            &source.degree_name,
            &source.degree_level,
        )?;

        let mut inserted = 0;
        for degree in targets {
            let target_key = source.for_degree(&degree.degree_name, &degree.degree_level);

            if ObjectiveEvalRepository::exists_on(conn, &target_key)? {
                tracing::debug!(
                    course = %target_key.course_num,
                    section = %target_key.sec_num,
                    objective = %target_key.obj_code,
                    degree = %target_key.degree_name,
                    level = %target_key.degree_level,
                    "目标学位语境已有评估，跳过复制"
                );
                continue;
            }

            ObjectiveEvalRepository::insert_on(
                conn,
                &ObjectiveEval {
                    key: target_key,
                    values: values.clone(),
                },
            )?;
            inserted += 1;
        }

        Ok(inserted)
    }
}
