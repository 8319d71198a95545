// ==========================================
// 成绩百分比过滤集成测试
// ==========================================
// 测试目标: 阈值边界、逐行独立判定、排序、输入校验
// ==========================================


use curriculum_eval::api::ApiError;
use curriculum_eval::domain::curriculum::Section;
use curriculum_eval::domain::types::Term;
use curriculum_eval::logging;
use test_helpers::{add_eval_entry, create_test_app, eval_form, seed_standard_curriculum};

/// 20 人班级 + 非 F 共 16 份 (16/20 = 80%)
async fn app_with_boundary_section() -> (tempfile::NamedTempFile, curriculum_eval::AppState) {
    let (tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    app.entry_api
        .offer_section(
            &Section {
                course_num: "CSE2340".into(),
                sec_num: "002".into(),
                sec_term: Term::Fall,
                sec_year: 2025,
                num_students: 20,
            },
            "INST001",
        )
        .unwrap();

    let mut form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "002",
        "LO1",
        "Final exam",
        (8, 5, 3, 4),
        None,
        false,
    );
    app.evaluation_api.save_from_form(&form).await.unwrap();

    (tmp, app)
}

#[tokio::test]
async fn test_threshold_boundary_passes_at_80_fails_at_81() {
    logging::init_test();
    let (_tmp, app) = app_with_boundary_section().await;

    // 16 >= 20 * 0.80 → 通过
    let at_80 = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "80")
        .unwrap();
    assert_eq!(at_80.len(), 1);
    assert_eq!(at_80[0].non_failing(), 16);
    assert_eq!(at_80[0].obj_title, "Analyze algorithm complexity");

    // 16 < 20 * 0.81 → 不通过
    let at_81 = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "81")
        .unwrap();
    assert!(at_81.is_empty());
}

#[tokio::test]
async fn test_each_evaluation_row_judged_independently() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    // 同一班级两条目标评估: LO1 达标 (28/30)，LO2 不达标 (18/30)
    let mut form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO1",
        "Final exam",
        (15, 8, 5, 2),
        None,
        false,
    );
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO2",
        "Lab series",
        (8, 6, 4, 12),
        None,
        false,
    );
    app.evaluation_api.save_from_form(&form).await.unwrap();

    let rows = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "75")
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].obj_code, "LO1");

    // 阈值降低后两行都出现，不做跨行聚合
    let rows = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "50")
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_rows_sorted_by_course_section_degree_objective() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    let mut bs_form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut bs_form,
        "CSE2340",
        "001",
        "LO2",
        "Lab series",
        (15, 8, 5, 2),
        None,
        false,
    );
    add_eval_entry(
        &mut bs_form,
        "CSE2340",
        "001",
        "LO1",
        "Final exam",
        (15, 8, 5, 2),
        None,
        false,
    );
    app.evaluation_api.save_from_form(&bs_form).await.unwrap();

    let mut ms_form = eval_form("Computer Science", "MS", "Fall", 2025);
    add_eval_entry(
        &mut ms_form,
        "CSE2340",
        "001",
        "LO1",
        "Graduate exam",
        (20, 6, 3, 1),
        None,
        false,
    );
    app.evaluation_api.save_from_form(&ms_form).await.unwrap();

    let rows = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "0")
        .unwrap();
    let order: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.degree_level.as_str(), r.obj_code.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("BS", "LO1"), ("BS", "LO2"), ("MS", "LO1")]
    );
}

#[tokio::test]
async fn test_non_numeric_percentage_is_input_error() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    let err = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "eighty")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = app
        .query_api
        .grade_threshold(Term::Fall, 2025, "120")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_other_semesters_are_excluded() {
    logging::init_test();
    let (_tmp, app) = app_with_boundary_section().await;

    let rows = app
        .query_api
        .grade_threshold(Term::Spring, 2025, "0")
        .unwrap();
    assert!(rows.is_empty());
}
