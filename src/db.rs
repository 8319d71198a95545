// ==========================================
// 学位项目评估跟踪系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，保证库/测试使用同一套 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 表结构：
/// - 基础数据: degree / course / instructor / learning_objective
/// - 关联关系: requires（学位↔课程, 含 core 标记）/ teaches / associated
/// - 开课记录: section
/// - 评估记录: objective_eval（七列复合主键）
/// - 配置: config_scope / config_kv
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS degree (
            degree_name TEXT NOT NULL,
            degree_level TEXT NOT NULL,
            PRIMARY KEY (degree_name, degree_level)
        );

        CREATE TABLE IF NOT EXISTS course (
            course_num TEXT PRIMARY KEY,
            course_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS instructor (
            instructor_id TEXT PRIMARY KEY,
            instructor_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS learning_objective (
            obj_code TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS requires (
            degree_name TEXT NOT NULL,
            degree_level TEXT NOT NULL,
            course_num TEXT NOT NULL,
            core INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (degree_name, degree_level, course_num),
            FOREIGN KEY (degree_name, degree_level) REFERENCES degree (degree_name, degree_level),
            FOREIGN KEY (course_num) REFERENCES course (course_num)
        );

        CREATE TABLE IF NOT EXISTS section (
            course_num TEXT NOT NULL,
            sec_num TEXT NOT NULL,
            sec_term TEXT NOT NULL,
            sec_year INTEGER NOT NULL,
            num_students INTEGER NOT NULL,
            PRIMARY KEY (course_num, sec_num, sec_term, sec_year),
            FOREIGN KEY (course_num) REFERENCES course (course_num)
        );

        CREATE TABLE IF NOT EXISTS teaches (
            course_num TEXT NOT NULL,
            sec_num TEXT NOT NULL,
            sec_term TEXT NOT NULL,
            sec_year INTEGER NOT NULL,
            instructor_id TEXT NOT NULL,
            PRIMARY KEY (course_num, sec_num, sec_term, sec_year, instructor_id),
            FOREIGN KEY (course_num, sec_num, sec_term, sec_year)
                REFERENCES section (course_num, sec_num, sec_term, sec_year),
            FOREIGN KEY (instructor_id) REFERENCES instructor (instructor_id)
        );

        -- associated 不对 requires 建外键：
        -- 学位↔课程↔目标关联的前置条件（是否要求 requires 行存在/core）
        -- 由可配置策略（association_rule）在 API 层判定
        CREATE TABLE IF NOT EXISTS associated (
            degree_name TEXT NOT NULL,
            degree_level TEXT NOT NULL,
            course_num TEXT NOT NULL,
            obj_code TEXT NOT NULL,
            PRIMARY KEY (degree_name, degree_level, course_num, obj_code),
            FOREIGN KEY (degree_name, degree_level) REFERENCES degree (degree_name, degree_level),
            FOREIGN KEY (course_num) REFERENCES course (course_num),
            FOREIGN KEY (obj_code) REFERENCES learning_objective (obj_code)
        );

        CREATE TABLE IF NOT EXISTS objective_eval (
            sec_num TEXT NOT NULL,
            sec_term TEXT NOT NULL,
            sec_year INTEGER NOT NULL,
            obj_code TEXT NOT NULL,
            degree_name TEXT NOT NULL,
            degree_level TEXT NOT NULL,
            course_num TEXT NOT NULL,
            based_on TEXT NOT NULL,
            perform_a INTEGER NOT NULL DEFAULT 0,
            perform_b INTEGER NOT NULL DEFAULT 0,
            perform_c INTEGER NOT NULL DEFAULT 0,
            perform_f INTEGER NOT NULL DEFAULT 0,
            improvements TEXT,
            PRIMARY KEY (sec_num, sec_term, sec_year, obj_code, degree_name, degree_level, course_num),
            FOREIGN KEY (course_num, sec_num, sec_term, sec_year)
                REFERENCES section (course_num, sec_num, sec_term, sec_year),
            FOREIGN KEY (degree_name, degree_level, course_num, obj_code)
                REFERENCES associated (degree_name, degree_level, course_num, obj_code)
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
