// ==========================================
// 学位项目评估跟踪系统 - 课程体系仓储
// ==========================================
// 职责: degree / course / instructor / learning_objective /
//       requires / associated 六张基础表的数据访问
// 红线: 不含业务逻辑，只负责数据访问
// ==========================================

use crate::domain::curriculum::{
    Course, CourseRequirement, Degree, Instructor, LearningObjective, ObjectiveAssociation,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// 行类型
// ==========================================

/// 学位课程清单行（requires ⋈ course）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DegreeCourseRow {
    pub course_num: String,
    pub course_name: String,
    pub core: bool,
}

/// 某课程下、以 core 要求它的学位及其预期目标数
/// （requires ⟕ associated 的 COUNT 聚合行）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DegreeExpectation {
    pub degree_name: String,
    pub degree_level: String,
    /// 该 (学位, 课程) 下已配置的目标数
    pub expected: i64,
}

// ==========================================
// CurriculumRepository - 课程体系仓储
// ==========================================
pub struct CurriculumRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CurriculumRepository {
    /// 创建新的 CurriculumRepository 实例
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
    // 写入接口（单行插入，重复主键/缺失外键由约束报错）
    // ==========================================

    /// 新增学位
    pub fn insert_degree(&self, degree: &Degree) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO degree (degree_name, degree_level) VALUES (?1, ?2)",
            params![degree.degree_name, degree.degree_level],
        )?;
        Ok(())
    }

    /// 新增课程
    pub fn insert_course(&self, course: &Course) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO course (course_num, course_name) VALUES (?1, ?2)",
            params![course.course_num, course.course_name],
        )?;
        Ok(())
    }

    /// 新增教师
    pub fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO instructor (instructor_id, instructor_name) VALUES (?1, ?2)",
            params![instructor.instructor_id, instructor.instructor_name],
        )?;
        Ok(())
    }

    /// 新增学习目标
    pub fn insert_objective(&self, objective: &LearningObjective) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO learning_objective (obj_code, title, description) VALUES (?1, ?2, ?3)",
            params![objective.obj_code, objective.title, objective.description],
        )?;
        Ok(())
    }

    /// 学位↔课程关联（requires 行）
    pub fn link_required_course(&self, requirement: &CourseRequirement) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO requires (degree_name, degree_level, course_num, core)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                requirement.degree_name,
                requirement.degree_level,
                requirement.course_num,
                requirement.core,
            ],
        )?;
        Ok(())
    }

    /// 学位语境下课程↔目标关联（associated 行）
    ///
    /// 注意: 前置策略（require_core / require_link / none）由 API 层判定，
    /// 这里只执行插入。
    pub fn link_objective(&self, association: &ObjectiveAssociation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO associated (degree_name, degree_level, course_num, obj_code)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                association.degree_name,
                association.degree_level,
                association.course_num,
                association.obj_code,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 清单查询（下拉框/选择页数据源）
    // ==========================================

    /// 全部学位，按名称排序
    pub fn list_degrees(&self) -> RepositoryResult<Vec<Degree>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT degree_name, degree_level FROM degree ORDER BY degree_name, degree_level",
        )?;
        let degrees = stmt
            .query_map([], |row| {
                Ok(Degree {
                    degree_name: row.get(0)?,
                    degree_level: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(degrees)
    }

    /// 全部课程，按课程号排序
    pub fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT course_num, course_name FROM course ORDER BY course_num")?;
        let courses = stmt
            .query_map([], |row| {
                Ok(Course {
                    course_num: row.get(0)?,
                    course_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(courses)
    }

    /// 全部教师，按姓名排序
    pub fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare("SELECT instructor_id, instructor_name FROM instructor ORDER BY instructor_name")?;
        let instructors = stmt
            .query_map([], |row| {
                Ok(Instructor {
                    instructor_id: row.get(0)?,
                    instructor_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(instructors)
    }

    /// 全部学习目标，按编码排序
    pub fn list_objectives(&self) -> RepositoryResult<Vec<LearningObjective>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare("SELECT obj_code, title, description FROM learning_objective ORDER BY obj_code")?;
        let objectives = stmt
            .query_map([], |row| {
                Ok(LearningObjective {
                    obj_code: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(objectives)
    }

    /// 至少被一个学位设为 core 的课程（目标关联表单的课程下拉框）
    pub fn list_core_courses(&self) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT R.course_num, C.course_name
            FROM requires R
            JOIN course C ON R.course_num = C.course_num
            WHERE R.core = 1
            GROUP BY R.course_num, C.course_name
            ORDER BY R.course_num
            "#,
        )?;
        let courses = stmt
            .query_map([], |row| {
                Ok(Course {
                    course_num: row.get(0)?,
                    course_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(courses)
    }

    // ==========================================
    // 单行查询
    // ==========================================

    /// 按主键查询 requires 行
    pub fn find_requirement(
        &self,
        degree_name: &str,
        degree_level: &str,
        course_num: &str,
    ) -> RepositoryResult<Option<CourseRequirement>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT degree_name, degree_level, course_num, core
                FROM requires
                WHERE degree_name = ?1 AND degree_level = ?2 AND course_num = ?3
                "#,
                params![degree_name, degree_level, course_num],
                |row| {
                    Ok(CourseRequirement {
                        degree_name: row.get(0)?,
                        degree_level: row.get(1)?,
                        course_num: row.get(2)?,
                        core: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // ==========================================
    // 学位视角查询（学位详情页）
    // ==========================================

    /// 学位的全部课程（core 优先，再按课程号）
    pub fn degree_courses(
        &self,
        degree_name: &str,
        degree_level: &str,
    ) -> RepositoryResult<Vec<DegreeCourseRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT R.course_num, C.course_name, R.core
            FROM requires R
            JOIN course C ON R.course_num = C.course_num
            WHERE R.degree_name = ?1 AND R.degree_level = ?2
            ORDER BY R.core DESC, R.course_num
            "#,
        )?;
        let rows = stmt
            .query_map(params![degree_name, degree_level], |row| {
                Ok(DegreeCourseRow {
                    course_num: row.get(0)?,
                    course_name: row.get(1)?,
                    core: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 学位的全部学习目标（去重，按编码）
    pub fn degree_objectives(
        &self,
        degree_name: &str,
        degree_level: &str,
    ) -> RepositoryResult<Vec<LearningObjective>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT L.obj_code, L.title, L.description
            FROM learning_objective L
            JOIN associated A ON L.obj_code = A.obj_code
            WHERE A.degree_name = ?1 AND A.degree_level = ?2
            GROUP BY L.obj_code, L.title, L.description
            ORDER BY L.obj_code
            "#,
        )?;
        let objectives = stmt
            .query_map(params![degree_name, degree_level], |row| {
                Ok(LearningObjective {
                    obj_code: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(objectives)
    }

    /// 学位下 (目标, 课程) 关联对
    pub fn degree_associations(
        &self,
        degree_name: &str,
        degree_level: &str,
    ) -> RepositoryResult<Vec<ObjectiveAssociation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT degree_name, degree_level, course_num, obj_code
            FROM associated
            WHERE degree_name = ?1 AND degree_level = ?2
            ORDER BY obj_code, course_num
            "#,
        )?;
        let links = stmt
            .query_map(params![degree_name, degree_level], |row| {
                Ok(ObjectiveAssociation {
                    degree_name: row.get(0)?,
                    degree_level: row.get(1)?,
                    course_num: row.get(2)?,
                    obj_code: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(links)
    }

    /// 某学位语境下某课程已关联的学习目标（评估录入页）
    pub fn objectives_for_degree_course(
        &self,
        degree_name: &str,
        degree_level: &str,
        course_num: &str,
    ) -> RepositoryResult<Vec<LearningObjective>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT L.obj_code, L.title, L.description
            FROM associated A
            JOIN learning_objective L ON A.obj_code = L.obj_code
            WHERE A.degree_name = ?1 AND A.degree_level = ?2 AND A.course_num = ?3
            ORDER BY L.obj_code
            "#,
        )?;
        let objectives = stmt
            .query_map(params![degree_name, degree_level, course_num], |row| {
                Ok(LearningObjective {
                    obj_code: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(objectives)
    }

    // ==========================================
    // 覆盖计算支撑查询
    // ==========================================

    /// 以 core 要求某课程的每个学位及其预期目标数
    pub fn core_degree_expectations(
        &self,
        course_num: &str,
    ) -> RepositoryResult<Vec<DegreeExpectation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT R.degree_name, R.degree_level, COUNT(A.obj_code) AS total_objs
            FROM requires R
            LEFT JOIN associated A ON R.course_num = A.course_num
                                  AND R.degree_name = A.degree_name
                                  AND R.degree_level = A.degree_level
            WHERE R.course_num = ?1
              AND R.core = 1
            GROUP BY R.degree_name, R.degree_level
            ORDER BY R.degree_name, R.degree_level
            "#,
        )?;
        let rows = stmt
            .query_map(params![course_num], |row| {
                Ok(DegreeExpectation {
                    degree_name: row.get(0)?,
                    degree_level: row.get(1)?,
                    expected: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 跨学位复制支撑查询
    // ==========================================

    /// 共享同一 (课程, 目标) 关联的其他学位（排除提交学位）
    ///
    /// 供保存引擎在批次事务内调用，因此以连接为参数。
    pub fn degrees_sharing_objective(
        conn: &Connection,
        course_num: &str,
        obj_code: &str,
        excluding_degree_name: &str,
        excluding_degree_level: &str,
    ) -> RepositoryResult<Vec<Degree>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT degree_name, degree_level
            FROM associated
            WHERE course_num = ?1
              AND obj_code = ?2
              AND NOT (degree_name = ?3 AND degree_level = ?4)
            ORDER BY degree_name, degree_level
            "#,
        )?;
        let degrees = stmt
            .query_map(
                params![
                    course_num,
                    obj_code,
                    excluding_degree_name,
                    excluding_degree_level
                ],
                |row| {
                    Ok(Degree {
                        degree_name: row.get(0)?,
                        degree_level: row.get(1)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(degrees)
    }
}
