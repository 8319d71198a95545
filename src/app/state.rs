// ==========================================
// 学位项目评估跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{CurriculumEntryApi, EvaluationApi, QueryApi};
use crate::config::config_manager::ConfigManager;
use crate::engine::{CoverageEngine, EvaluationSaveEngine, GradeThresholdFilter};
use crate::repository::{
    CurriculumRepository, ObjectiveEvalRepository, SectionRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 基础数据录入API
    pub entry_api: Arc<CurriculumEntryApi<ConfigManager>>,

    /// 评估录入API
    pub evaluation_api: Arc<EvaluationApi<ConfigManager>>,

    /// 查询API
    pub query_api: Arc<QueryApi>,

    /// 配置管理器（策略覆写入口）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并应用统一 PRAGMA
    /// 2. 确保 schema 就绪
    /// 3. 初始化所有 Repository / Engine / API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("schema 初始化失败: {}", e))?;

        match crate::db::read_schema_version(&conn) {
            Ok(Some(v)) if v != crate::db::CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    found = v,
                    expected = crate::db::CURRENT_SCHEMA_VERSION,
                    "schema_version 与当前代码不一致"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("schema_version 读取失败: {}", e),
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let curriculum_repo = Arc::new(CurriculumRepository::from_connection(Arc::clone(&conn)));
        let section_repo = Arc::new(SectionRepository::from_connection(Arc::clone(&conn)));
        let eval_repo = Arc::new(ObjectiveEvalRepository::from_connection(Arc::clone(&conn)));

        // ==========================================
        // 初始化配置层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("配置管理器初始化失败: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let coverage_engine = Arc::new(CoverageEngine::new(
            Arc::clone(&section_repo),
            Arc::clone(&curriculum_repo),
            Arc::clone(&eval_repo),
        ));
        let threshold_filter = Arc::new(GradeThresholdFilter::new(Arc::clone(&eval_repo)));
        let save_engine = Arc::new(EvaluationSaveEngine::new(
            Arc::clone(&conn),
            Arc::clone(&config_manager),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let entry_api = Arc::new(CurriculumEntryApi::new(
            Arc::clone(&curriculum_repo),
            Arc::clone(&section_repo),
            Arc::clone(&config_manager),
        ));
        let evaluation_api = Arc::new(EvaluationApi::new(
            Arc::clone(&curriculum_repo),
            Arc::clone(&section_repo),
            Arc::clone(&eval_repo),
            save_engine,
        ));
        let query_api = Arc::new(QueryApi::new(
            curriculum_repo,
            section_repo,
            coverage_engine,
            threshold_filter,
        ));

        tracing::info!("AppState初始化成功");

        Ok(Self {
            db_path,
            entry_api,
            evaluation_api,
            query_api,
            config_manager,
        })
    }
}

/// 默认数据库路径（用户数据目录下，目录不存在时创建）
pub fn get_default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("curriculum-eval");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("数据目录创建失败({}), 回退到当前目录: {}", dir.display(), e);
        return "curriculum_eval.db".to_string();
    }
    dir.join("curriculum_eval.db").to_string_lossy().to_string()
}
