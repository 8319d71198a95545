// ==========================================
// 学位项目评估跟踪系统 - 配置管理器
// ==========================================
// 职责: 策略配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::policy_trait::EvalPolicyReader;
use crate::domain::types::{AssociationRule, EnrollmentRule};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 目标关联前置策略的配置键
pub const KEY_ASSOCIATION_RULE: &str = "association_rule";
/// 选课人数校验策略的配置键
pub const KEY_ENROLLMENT_RULE: &str = "enrollment_rule";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = crate::db::open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

// ==========================================
// EvalPolicyReader 实现
// ==========================================
// 未知的存量值回退到默认策略并告警，避免静默改变校验行为
#[async_trait]
impl EvalPolicyReader for ConfigManager {
    async fn get_association_rule(&self) -> Result<AssociationRule, Box<dyn Error>> {
        let raw = self.get_config_value(KEY_ASSOCIATION_RULE)?;
        Ok(match raw {
            None => AssociationRule::RequireCore,
            Some(v) => AssociationRule::from_db_str(&v).unwrap_or_else(|| {
                tracing::warn!(
                    value = %v,
                    "association_rule 配置值无法识别，回退为 require_core"
                );
                AssociationRule::RequireCore
            }),
        })
    }

    async fn get_enrollment_rule(&self) -> Result<EnrollmentRule, Box<dyn Error>> {
        let raw = self.get_config_value(KEY_ENROLLMENT_RULE)?;
        Ok(match raw {
            None => EnrollmentRule::Exact,
            Some(v) => EnrollmentRule::from_db_str(&v).unwrap_or_else(|| {
                tracing::warn!(
                    value = %v,
                    "enrollment_rule 配置值无法识别，回退为 exact"
                );
                EnrollmentRule::Exact
            }),
        })
    }
}
