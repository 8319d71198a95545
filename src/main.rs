// ==========================================
// 学位项目评估跟踪系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// ==========================================

use curriculum_eval::app::{get_default_db_path, AppState};
use curriculum_eval::domain::types::current_semester;

fn main() {
    // 初始化日志系统
    curriculum_eval::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", curriculum_eval::APP_NAME);
    tracing::info!("系统版本: {}", curriculum_eval::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::new(db_path).expect("无法初始化AppState");

    let (term, year) = current_semester();
    match app_state.query_api.evaluation_status(term, year) {
        Ok(report) => {
            tracing::info!(
                term = %term,
                year,
                sections = report.len(),
                "当前学期评估覆盖概览"
            );
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("覆盖概览序列化失败: {}", e),
            }
        }
        Err(e) => tracing::warn!("覆盖概览查询失败: {}", e),
    }

    tracing::info!("{}", curriculum_eval::i18n::t("app.started"));
}
