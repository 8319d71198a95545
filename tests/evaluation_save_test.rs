// ==========================================
// 评估保存引擎集成测试
// ==========================================
// 测试目标: upsert 幂等性、选课人数校验、批次原子性
// ==========================================


use curriculum_eval::api::ApiError;
use curriculum_eval::domain::evaluation::EvalKey;
use curriculum_eval::domain::types::Term;
use curriculum_eval::logging;
use test_helpers::{add_eval_entry, create_test_app, eval_form, seed_standard_curriculum};

fn lo1_key() -> EvalKey {
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

#[tokio::test]
async fn test_save_inserts_new_evaluation() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    let mut form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO1",
        "Final exam Q3",
        (10, 12, 6, 2),
        Some("Add recursion drills"),
        false,
    );

    let outcome = app.evaluation_api.save_from_form(&form).await.unwrap();
    assert_eq!(outcome.rows_written, 1);

    let views = app
        .evaluation_api
        .entry_view("Computer Science", "BS", "INST001", Term::Fall, 2025)
        .unwrap();
    assert_eq!(views.len(), 1);
    let lo1 = views[0]
        .objectives
        .iter()
        .find(|o| o.objective.obj_code == "LO1")
        .unwrap();
    let stored = lo1.existing.as_ref().unwrap();
    assert_eq!(stored.values.based_on, "Final exam Q3");
    assert_eq!(stored.values.perform_a, 10);
    assert_eq!(
        stored.values.improvements.as_deref(),
        Some("Add recursion drills")
    );
}

#[tokio::test]
async fn test_upsert_is_idempotent_by_composite_key() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    let mut first = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut first,
        "CSE2340",
        "001",
        "LO1",
        "Midterm",
        (10, 10, 8, 2),
        None,
        false,
    );
    app.evaluation_api.save_from_form(&first).await.unwrap();

    // 同一复合主键的第二次提交覆盖前值
    let mut second = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut second,
        "CSE2340",
        "001",
        "LO1",
        "Final exam",
        (15, 8, 5, 2),
        None,
        false,
    );
    let outcome = app.evaluation_api.save_from_form(&second).await.unwrap();
    assert_eq!(outcome.rows_written, 1);

    let eval_repo = curriculum_eval::repository::ObjectiveEvalRepository::new(&app.db_path).unwrap();
    let stored = eval_repo.find_by_key(&lo1_key()).unwrap().unwrap();
    assert_eq!(stored.values.based_on, "Final exam");
    assert_eq!(stored.values.perform_a, 15);

    // 仅存在一行: 该 (班级, 学位) 的录入计数仍为 1
    let (entered, _) = eval_repo
        .coverage_counts("001", Term::Fall, 2025, "CSE2340", "Computer Science", "BS")
        .unwrap();
    assert_eq!(entered, 1);
}

#[tokio::test]
async fn test_enrollment_mismatch_rejects_batch() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    // 30 人班级只录了 25 份成绩
    let mut form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO1",
        "Project 1",
        (10, 10, 3, 2),
        None,
        false,
    );

    let err = app.evaluation_api.save_from_form(&form).await.unwrap_err();
    match err {
        ApiError::ValidationError(msg) => {
            assert!(msg.contains("CSE2340"));
            assert!(msg.contains("001"));
            assert!(msg.contains("25"));
            assert!(msg.contains("30"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 评估表保持为空
    let eval_repo = curriculum_eval::repository::ObjectiveEvalRepository::new(&app.db_path).unwrap();
    assert!(eval_repo.find_by_key(&lo1_key()).unwrap().is_none());
}

#[tokio::test]
async fn test_batch_atomicity_valid_plus_invalid_commits_nothing() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    // LO1 合法（30 份），LO2 不合法（20 份）；LO1 排序在前先被写入
    let mut form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO1",
        "Final exam",
        (12, 10, 6, 2),
        None,
        false,
    );
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO2",
        "Lab series",
        (10, 5, 3, 2),
        None,
        false,
    );

    assert!(app.evaluation_api.save_from_form(&form).await.is_err());

    // 整批回滚，合法条目也不落库
    let eval_repo = curriculum_eval::repository::ObjectiveEvalRepository::new(&app.db_path).unwrap();
    assert!(eval_repo.find_by_key(&lo1_key()).unwrap().is_none());
}

#[tokio::test]
async fn test_allow_under_policy_accepts_partial_counts() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    app.config_manager
        .set_config_value("enrollment_rule", "allow_under")
        .unwrap();

    // 宽松策略: 25 < 30 可以保存
    let mut form = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO1",
        "Project 1",
        (10, 10, 3, 2),
        None,
        false,
    );
    let outcome = app.evaluation_api.save_from_form(&form).await.unwrap();
    assert_eq!(outcome.rows_written, 1);

    // 超出选课人数仍然拒绝
    let mut over = eval_form("Computer Science", "BS", "Fall", 2025);
    add_eval_entry(
        &mut over,
        "CSE2340",
        "001",
        "LO2",
        "Quiz",
        (20, 10, 3, 2),
        None,
        false,
    );
    assert!(app.evaluation_api.save_from_form(&over).await.is_err());
}

#[tokio::test]
async fn test_unlinked_objective_surfaces_referential_error() {
    logging::init_test();
    let (_tmp, app) = create_test_app();
    seed_standard_curriculum(&app).await;

    // LO3 未关联到 MS 语境
    let mut form = eval_form("Computer Science", "MS", "Fall", 2025);
    add_eval_entry(
        &mut form,
        "CSE2340",
        "001",
        "LO3",
        "Essay",
        (20, 5, 3, 2),
        None,
        false,
    );

    let err = app.evaluation_api.save_from_form(&form).await.unwrap_err();
    assert!(matches!(err, ApiError::ReferentialIntegrity(_)));
}
