// ==========================================
// 学位项目评估跟踪系统 - 开课记录仓储
// ==========================================
// 职责: section / teaches 两张表的数据访问与关联查询
// 红线: 不含业务逻辑，只负责数据访问
// ==========================================

use crate::domain::curriculum::{Section, SectionKey};
use crate::domain::types::Term;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 学期列的 SQL 时间序（Spring < Summer < Fall）
fn term_order_case(column: &str) -> String {
    format!("CASE {column} WHEN 'Spring' THEN 0 WHEN 'Summer' THEN 1 WHEN 'Fall' THEN 2 ELSE 3 END")
}

/// 解析数据库中的学期列（入库值由 API 层校验）
fn parse_term(s: &str) -> Term {
    Term::from_db_str(s).unwrap_or(Term::Fall)
}

// ==========================================
// 行类型
// ==========================================

/// 某学期的开课班级（含课程名与授课教师）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SectionOffering {
    pub course_num: String,
    pub course_name: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub num_students: i32,
    /// 无授课分配时为 None
    pub instructor_name: Option<String>,
}

/// 某教师某学期所授班级（评估录入页的班级清单）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaughtSectionRow {
    pub sec_num: String,
    pub course_num: String,
    pub course_name: String,
}

/// 学位课程的开课记录行（年度区间查询）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DegreeSectionRow {
    pub course_num: String,
    pub course_name: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub core: bool,
}

/// 单门课程的开课记录行（年度区间查询）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CourseSectionRow {
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
    pub num_students: i32,
    pub instructor_name: Option<String>,
}

/// 教师授课历史行（年度区间查询）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstructorSectionRow {
    pub course_num: String,
    pub course_name: String,
    pub sec_num: String,
    pub sec_term: Term,
    pub sec_year: i32,
}

// ==========================================
// SectionRepository - 开课记录仓储
// ==========================================
pub struct SectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SectionRepository {
    /// 创建新的 SectionRepository 实例
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
    // 写入接口
    // ==========================================

    /// 开设班级: 同一事务内写入 section 与 teaches
    pub fn offer(&self, section: &Section, instructor_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO section (course_num, sec_num, sec_term, sec_year, num_students)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                section.course_num,
                section.sec_num,
                section.sec_term.to_db_str(),
                section.sec_year,
                section.num_students,
            ],
        )?;

        tx.execute(
            r#"
            INSERT INTO teaches (course_num, sec_num, sec_term, sec_year, instructor_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                section.course_num,
                section.sec_num,
                section.sec_term.to_db_str(),
                section.sec_year,
                instructor_id,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按主键查询班级
    pub fn find_by_key(&self, key: &SectionKey) -> RepositoryResult<Option<Section>> {
        let conn = self.get_conn()?;
        Self::find_on(&conn, key)
    }

    /// 按主键查询班级（事务内变体，供保存引擎使用）
    pub fn find_on(conn: &Connection, key: &SectionKey) -> RepositoryResult<Option<Section>> {
        let result = conn
            .query_row(
                r#"
                SELECT course_num, sec_num, sec_term, sec_year, num_students
                FROM section
                WHERE course_num = ?1 AND sec_num = ?2 AND sec_term = ?3 AND sec_year = ?4
                "#,
                params![key.course_num, key.sec_num, key.term.to_db_str(), key.year],
                |row| {
                    Ok(Section {
                        course_num: row.get(0)?,
                        sec_num: row.get(1)?,
                        sec_term: parse_term(&row.get::<_, String>(2)?),
                        sec_year: row.get(3)?,
                        num_students: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// 某学期全部开课班级（含课程名与授课教师，覆盖报表的主清单）
    pub fn find_semester_offerings(
        &self,
        term: Term,
        year: i32,
    ) -> RepositoryResult<Vec<SectionOffering>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT S.course_num, C.course_name, S.sec_num, S.sec_term, S.sec_year,
                   S.num_students, I.instructor_name
            FROM section S
            JOIN course C ON S.course_num = C.course_num
            LEFT JOIN teaches T ON S.sec_num = T.sec_num AND S.course_num = T.course_num
                                AND S.sec_term = T.sec_term AND S.sec_year = T.sec_year
            LEFT JOIN instructor I ON T.instructor_id = I.instructor_id
            WHERE S.sec_term = ?1 AND S.sec_year = ?2
            ORDER BY S.course_num, S.sec_num
            "#,
        )?;
        let offerings = stmt
            .query_map(params![term.to_db_str(), year], |row| {
                Ok(SectionOffering {
                    course_num: row.get(0)?,
                    course_name: row.get(1)?,
                    sec_num: row.get(2)?,
                    sec_term: parse_term(&row.get::<_, String>(3)?),
                    sec_year: row.get(4)?,
                    num_students: row.get(5)?,
                    instructor_name: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(offerings)
    }

    /// 某教师某学期所授的全部班级（评估录入页）
    pub fn find_taught_sections(
        &self,
        instructor_id: &str,
        term: Term,
        year: i32,
    ) -> RepositoryResult<Vec<TaughtSectionRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT T.sec_num, T.course_num, C.course_name
            FROM teaches T
            JOIN course C ON T.course_num = C.course_num
            WHERE T.instructor_id = ?1 AND T.sec_term = ?2 AND T.sec_year = ?3
            ORDER BY T.course_num, T.sec_num
            "#,
        )?;
        let rows = stmt
            .query_map(params![instructor_id, term.to_db_str(), year], |row| {
                Ok(TaughtSectionRow {
                    sec_num: row.get(0)?,
                    course_num: row.get(1)?,
                    course_name: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 某学位课程在年度区间内的开课记录，按时间序
    pub fn find_degree_sections(
        &self,
        degree_name: &str,
        degree_level: &str,
        start_year: i32,
        end_year: i32,
    ) -> RepositoryResult<Vec<DegreeSectionRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT S.course_num, C.course_name, S.sec_num, S.sec_term, S.sec_year, R.core
            FROM section S
            JOIN course C ON S.course_num = C.course_num
            JOIN requires R ON S.course_num = R.course_num
                           AND R.degree_name = ?1 AND R.degree_level = ?2
            WHERE S.sec_year BETWEEN ?3 AND ?4
            ORDER BY S.sec_year, {term_order}, S.course_num, S.sec_num
            "#,
            term_order = term_order_case("S.sec_term")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![degree_name, degree_level, start_year, end_year],
                |row| {
                    Ok(DegreeSectionRow {
                        course_num: row.get(0)?,
                        course_name: row.get(1)?,
                        sec_num: row.get(2)?,
                        sec_term: parse_term(&row.get::<_, String>(3)?),
                        sec_year: row.get(4)?,
                        core: row.get(5)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 某课程在年度区间内的开课记录，按时间序
    pub fn find_course_sections(
        &self,
        course_num: &str,
        start_year: i32,
        end_year: i32,
    ) -> RepositoryResult<Vec<CourseSectionRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT S.sec_num, S.sec_term, S.sec_year, S.num_students, I.instructor_name
            FROM section S
            LEFT JOIN teaches T ON S.sec_num = T.sec_num AND S.course_num = T.course_num
                                AND S.sec_term = T.sec_term AND S.sec_year = T.sec_year
            LEFT JOIN instructor I ON T.instructor_id = I.instructor_id
            WHERE S.course_num = ?1 AND S.sec_year BETWEEN ?2 AND ?3
            ORDER BY S.sec_year, {term_order}, S.sec_num
            "#,
            term_order = term_order_case("S.sec_term")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![course_num, start_year, end_year], |row| {
                Ok(CourseSectionRow {
                    sec_num: row.get(0)?,
                    sec_term: parse_term(&row.get::<_, String>(1)?),
                    sec_year: row.get(2)?,
                    num_students: row.get(3)?,
                    instructor_name: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 某教师在年度区间内授过的全部班级，按时间序
    pub fn find_instructor_sections(
        &self,
        instructor_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> RepositoryResult<Vec<InstructorSectionRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT T.course_num, C.course_name, T.sec_num, T.sec_term, T.sec_year
            FROM teaches T
            JOIN section S ON T.sec_num = S.sec_num AND T.course_num = S.course_num
                           AND T.sec_term = S.sec_term AND T.sec_year = S.sec_year
            JOIN course C ON T.course_num = C.course_num
            WHERE T.instructor_id = ?1 AND T.sec_year BETWEEN ?2 AND ?3
            ORDER BY T.sec_year, {term_order}, T.course_num, T.sec_num
            "#,
            term_order = term_order_case("T.sec_term")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![instructor_id, start_year, end_year], |row| {
                Ok(InstructorSectionRow {
                    course_num: row.get(0)?,
                    course_name: row.get(1)?,
                    sec_num: row.get(2)?,
                    sec_term: parse_term(&row.get::<_, String>(3)?),
                    sec_year: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
