// ==========================================
// 学位项目评估跟踪系统 - 目标评估仓储
// ==========================================
// 职责: objective_eval 表的数据访问
// 红线: 不含业务逻辑，只负责数据访问
// 说明: 保存引擎需要把一个批次的全部读写放进同一事务，
//       因此核心语句同时提供以连接为参数的 *_on 变体
//       （rusqlite 的 Transaction 可解引用为 Connection）
// ==========================================

use crate::domain::evaluation::{EvalKey, EvalValues, ObjectiveEval};
use crate::domain::types::Term;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 解析数据库中的学期列（入库值由 API 层校验）
fn parse_term(s: &str) -> Term {
    Term::from_db_str(s).unwrap_or(Term::Fall)
}

// ==========================================
// 行类型
// ==========================================

/// 某学期单条评估的报表行（objective_eval ⋈ section ⋈ course ⋈ learning_objective）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SemesterEvalRow {
    pub course_num: String,
    pub course_name: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub num_students: i32,
    pub degree_name: String,
    pub degree_level: String,
    pub obj_code: String,
    pub obj_title: String,
    pub based_on: String,
    pub perform_a: i32,
    pub perform_b: i32,
    pub perform_c: i32,
    pub perform_f: i32,
}

impl SemesterEvalRow {
    /// 非 F 成绩数 (A+B+C)
    pub fn non_failing(&self) -> i32 {
        self.perform_a + self.perform_b + self.perform_c
    }
}

// ==========================================
// ObjectiveEvalRepository - 目标评估仓储
// ==========================================
pub struct ObjectiveEvalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ObjectiveEvalRepository {
    /// 创建新的 ObjectiveEvalRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 复合主键单行操作
    // ==========================================

    /// 按复合主键查询
    pub fn find_by_key(&self, key: &EvalKey) -> RepositoryResult<Option<ObjectiveEval>> {
        let conn = self.get_conn()?;
        Self::find_on(&conn, key)
    }

    /// 按复合主键查询（事务内变体）
    pub fn find_on(conn: &Connection, key: &EvalKey) -> RepositoryResult<Option<ObjectiveEval>> {
        let result = conn
            .query_row(
                r#"
                SELECT sec_num, sec_term, sec_year, obj_code,
                       degree_name, degree_level, course_num,
                       based_on, perform_a, perform_b, perform_c, perform_f, improvements
                FROM objective_eval
                WHERE sec_num = ?1 AND sec_term = ?2 AND sec_year = ?3
                  AND obj_code = ?4 AND degree_name = ?5 AND degree_level = ?6
                  AND course_num = ?7
                "#,
                params![
                    key.sec_num,
                    key.sec_term.to_db_str(),
                    key.sec_year,
                    key.obj_code,
                    key.degree_name,
                    key.degree_level,
                    key.course_num,
                ],
                |row| {
                    Ok(ObjectiveEval {
                        key: EvalKey {
                            sec_num: row.get(0)?,
                            sec_term: parse_term(&row.get::<_, String>(1)?),
                            sec_year: row.get(2)?,
                            obj_code: row.get(3)?,
                            degree_name: row.get(4)?,
                            degree_level: row.get(5)?,
                            course_num: row.get(6)?,
                        },
                        values: EvalValues {
                            based_on: row.get(7)?,
                            perform_a: row.get(8)?,
                            perform_b: row.get(9)?,
                            perform_c: row.get(10)?,
                            perform_f: row.get(11)?,
                            improvements: row.get(12)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// 复合主键存在性检查（事务内变体）
    pub fn exists_on(conn: &Connection, key: &EvalKey) -> RepositoryResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                r#"
                SELECT 1 FROM objective_eval
                WHERE sec_num = ?1 AND sec_term = ?2 AND sec_year = ?3
                  AND obj_code = ?4 AND degree_name = ?5 AND degree_level = ?6
                  AND course_num = ?7
                "#,
                params![
                    key.sec_num,
                    key.sec_term.to_db_str(),
                    key.sec_year,
                    key.obj_code,
                    key.degree_name,
                    key.degree_level,
                    key.course_num,
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 插入新评估行（事务内变体）
    pub fn insert_on(conn: &Connection, eval: &ObjectiveEval) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO objective_eval
                (based_on, perform_a, perform_b, perform_c, perform_f, improvements,
                 sec_num, sec_term, sec_year, obj_code, degree_name, degree_level, course_num)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                eval.values.based_on,
                eval.values.perform_a,
                eval.values.perform_b,
                eval.values.perform_c,
                eval.values.perform_f,
                eval.values.improvements,
                eval.key.sec_num,
                eval.key.sec_term.to_db_str(),
                eval.key.sec_year,
                eval.key.obj_code,
                eval.key.degree_name,
                eval.key.degree_level,
                eval.key.course_num,
            ],
        )?;
        Ok(())
    }

    /// 原地更新五个可变属性（事务内变体）
    pub fn update_on(
        conn: &Connection,
        key: &EvalKey,
        values: &EvalValues,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            UPDATE objective_eval
            SET based_on = ?1, perform_a = ?2, perform_b = ?3,
                perform_c = ?4, perform_f = ?5, improvements = ?6
            WHERE sec_num = ?7 AND sec_term = ?8 AND sec_year = ?9
              AND obj_code = ?10 AND degree_name = ?11 AND degree_level = ?12
              AND course_num = ?13
            "#,
            params![
                values.based_on,
                values.perform_a,
                values.perform_b,
                values.perform_c,
                values.perform_f,
                values.improvements,
                key.sec_num,
                key.sec_term.to_db_str(),
                key.sec_year,
                key.obj_code,
                key.degree_name,
                key.degree_level,
                key.course_num,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 聚合查询
    // ==========================================

    /// 某 (班级, 学位, 课程) 下已录入的评估数与含改进叙述的评估数
    pub fn coverage_counts(
        &self,
        sec_num: &str,
        term: Term,
        year: i32,
        course_num: &str,
        degree_name: &str,
        degree_level: &str,
    ) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let (entered, improved) = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN improvements IS NOT NULL AND improvements != ''
                                     THEN 1 ELSE 0 END), 0)
            FROM objective_eval
            WHERE sec_num = ?1 AND sec_term = ?2 AND sec_year = ?3
              AND course_num = ?4 AND degree_name = ?5 AND degree_level = ?6
            "#,
            params![
                sec_num,
                term.to_db_str(),
                year,
                course_num,
                degree_name,
                degree_level
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((entered, improved))
    }

    /// 某学期全部评估行（百分比过滤报表的数据源）
    ///
    /// 每行独立返回，不做跨目标聚合。
    pub fn semester_rows(&self, term: Term, year: i32) -> RepositoryResult<Vec<SemesterEvalRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT OE.course_num, C.course_name, OE.sec_num, OE.sec_term, OE.sec_year,
                   S.num_students, OE.degree_name, OE.degree_level,
                   OE.obj_code, L.title, OE.based_on,
                   OE.perform_a, OE.perform_b, OE.perform_c, OE.perform_f
            FROM objective_eval OE
            JOIN section S ON OE.course_num = S.course_num AND OE.sec_num = S.sec_num
                          AND OE.sec_term = S.sec_term AND OE.sec_year = S.sec_year
            JOIN course C ON OE.course_num = C.course_num
            JOIN learning_objective L ON OE.obj_code = L.obj_code
            WHERE OE.sec_term = ?1 AND OE.sec_year = ?2
            "#,
        )?;
        let rows = stmt
            .query_map(params![term.to_db_str(), year], |row| {
                Ok(SemesterEvalRow {
                    course_num: row.get(0)?,
                    course_name: row.get(1)?,
                    sec_num: row.get(2)?,
                    sec_term: parse_term(&row.get::<_, String>(3)?),
                    sec_year: row.get(4)?,
                    num_students: row.get(5)?,
                    degree_name: row.get(6)?,
                    degree_level: row.get(7)?,
                    obj_code: row.get(8)?,
                    obj_title: row.get(9)?,
                    based_on: row.get(10)?,
                    perform_a: row.get(11)?,
                    perform_b: row.get(12)?,
                    perform_c: row.get(13)?,
                    perform_f: row.get(14)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::curriculum::{
        Course, CourseRequirement, Degree, Instructor, LearningObjective, ObjectiveAssociation,
        Section,
    };
    use crate::repository::curriculum_repo::CurriculumRepository;
    use crate::repository::section_repo::SectionRepository;

    fn setup_seeded_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let curriculum = CurriculumRepository::from_connection(Arc::clone(&conn));
        curriculum
            .insert_degree(&Degree {
                degree_name: "Computer Science".into(),
                degree_level: "BS".into(),
            })
            .unwrap();
        curriculum
            .insert_course(&Course {
                course_num: "CSE2340".into(),
                course_name: "Data Structures".into(),
            })
            .unwrap();
        curriculum
            .insert_instructor(&Instructor {
                instructor_id: "INST001".into(),
                instructor_name: "Ada Lovelace".into(),
            })
            .unwrap();
        curriculum
            .insert_objective(&LearningObjective {
                obj_code: "LO1".into(),
                title: "Analyze algorithms".into(),
                description: None,
            })
            .unwrap();
        curriculum
            .link_required_course(&CourseRequirement {
                degree_name: "Computer Science".into(),
                degree_level: "BS".into(),
                course_num: "CSE2340".into(),
                core: true,
            })
            .unwrap();
        curriculum
            .link_objective(&ObjectiveAssociation {
                degree_name: "Computer Science".into(),
                degree_level: "BS".into(),
                course_num: "CSE2340".into(),
                obj_code: "LO1".into(),
            })
            .unwrap();

        let sections = SectionRepository::from_connection(Arc::clone(&conn));
        sections
            .offer(
                &Section {
                    course_num: "CSE2340".into(),
                    sec_num: "001".into(),
                    sec_term: Term::Fall,
                    sec_year: 2025,
                    num_students: 30,
                },
                "INST001",
            )
            .unwrap();

        conn
    }

    fn make_key() -> EvalKey {
        EvalKey {
            sec_num: "001".into(),
            sec_term: Term::Fall,
            sec_year: 2025,
            obj_code: "LO1".into(),
            degree_name: "Computer Science".into(),
            degree_level: "BS".into(),
            course_num: "CSE2340".into(),
        }
    }

    #[test]
    fn test_insert_find_update_roundtrip() {
        let conn = setup_seeded_db();
        let repo = ObjectiveEvalRepository::from_connection(Arc::clone(&conn));

        let key = make_key();
        {
            let guard = conn.lock().unwrap();
            assert!(!ObjectiveEvalRepository::exists_on(&guard, &key).unwrap());
            ObjectiveEvalRepository::insert_on(
                &guard,
                &ObjectiveEval {
                    key: key.clone(),
                    values: EvalValues {
                        based_on: "Final exam Q3".into(),
                        perform_a: 10,
                        perform_b: 12,
                        perform_c: 6,
                        perform_f: 2,
                        improvements: None,
                    },
                },
            )
            .unwrap();
            assert!(ObjectiveEvalRepository::exists_on(&guard, &key).unwrap());

            ObjectiveEvalRepository::update_on(
                &guard,
                &key,
                &EvalValues {
                    based_on: "Final exam Q3 (rev)".into(),
                    perform_a: 11,
                    perform_b: 11,
                    perform_c: 6,
                    perform_f: 2,
                    improvements: Some("More practice problems".into()),
                },
            )
            .unwrap();
        }

        let found = repo.find_by_key(&key).unwrap().unwrap();
        assert_eq!(found.values.based_on, "Final exam Q3 (rev)");
        assert_eq!(found.values.perform_a, 11);
        assert_eq!(
            found.values.improvements.as_deref(),
            Some("More practice problems")
        );
    }

    #[test]
    fn test_insert_without_association_is_referential_error() {
        let conn = setup_seeded_db();
        let guard = conn.lock().unwrap();

        let mut key = make_key();
        key.obj_code = "LO9".into(); // 未关联的目标
        let err = ObjectiveEvalRepository::insert_on(
            &guard,
            &ObjectiveEval {
                key,
                values: EvalValues {
                    based_on: "Quiz".into(),
                    ..EvalValues::default()
                },
            },
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_coverage_counts_and_improvement_flag() {
        let conn = setup_seeded_db();
        let repo = ObjectiveEvalRepository::from_connection(Arc::clone(&conn));

        {
            let guard = conn.lock().unwrap();
            ObjectiveEvalRepository::insert_on(
                &guard,
                &ObjectiveEval {
                    key: make_key(),
                    values: EvalValues {
                        based_on: "Project 2".into(),
                        perform_a: 30,
                        improvements: Some("".into()), // 空串不算改进叙述
                        ..EvalValues::default()
                    },
                },
            )
            .unwrap();
        }

        let (entered, improved) = repo
            .coverage_counts("001", Term::Fall, 2025, "CSE2340", "Computer Science", "BS")
            .unwrap();
        assert_eq!(entered, 1);
        assert_eq!(improved, 0);
    }
}
