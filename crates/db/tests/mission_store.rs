//! Integration tests for agent registration and mission persistence.
//!
//! Exercises the repository layer against a real database:
//! - Atomic mission + task creation (and rollback on a failing insert)
//! - Ordered task reads
//! - Guarded status transitions for missions and tasks
//! - Startup recovery of orphaned running missions

use miso_db::models::agent::CreateAgent;
use miso_db::models::mission::{CreateMission, CreateMissionTask, MissionListQuery};
use miso_db::models::status::{MissionStatus, TaskStatus};
use miso_db::repositories::{AgentRepo, MissionRepo, MissionTaskRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_agent(name: &str, runtime: &str) -> CreateAgent {
    CreateAgent {
        name: name.to_string(),
        purpose: Some("testing".to_string()),
        runtime: runtime.to_string(),
        command: Some("cat".to_string()),
    }
}

fn step(agent_id: i64, step_number: i32, input: Option<&str>) -> CreateMissionTask {
    CreateMissionTask {
        agent_id,
        step_number,
        input_data: input.map(str::to_string),
    }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_and_find_agent(pool: PgPool) {
    let agent = AgentRepo::create(&pool, &new_agent("Writer", "  MISO_AI ")).await.unwrap();
    assert_eq!(agent.runtime, "MISO_AI");
    assert_eq!(agent.status, "idle");
    assert!(agent.target().is_local());

    let found = AgentRepo::find_by_id(&pool, agent.id).await.unwrap().unwrap();
    assert_eq!(found.name, "Writer");

    assert!(AgentRepo::find_by_id(&pool, agent.id + 1000).await.unwrap().is_none());
    assert_eq!(AgentRepo::list(&pool).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Atomic creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_mission_with_tasks(pool: PgPool) {
    let agent = AgentRepo::create(&pool, &new_agent("Runner", "js-runner")).await.unwrap();
    let input = CreateMission {
        name: "Pipeline".to_string(),
        tasks: vec![
            step(agent.id, 20, None),
            step(agent.id, 10, Some("seed")),
        ],
    };

    let (mission, tasks) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();

    assert_eq!(mission.status_id, MissionStatus::Pending.id());
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].step_number, 10);
    assert_eq!(tasks[0].input_data.as_deref(), Some("seed"));
    assert!(tasks.iter().all(|t| t.status_id == TaskStatus::Pending.id()));
    assert!(tasks.iter().all(|t| t.mission_id == mission.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_task_insert_rolls_back_everything(pool: PgPool) {
    // The duplicate step number violates uq_mission_tasks_mission_step on the
    // third insert, after the mission row and the first task were written.
    let input = CreateMission {
        name: "Broken".to_string(),
        tasks: vec![step(1, 1, None), step(1, 2, None), step(1, 1, None)],
    };

    let err = MissionRepo::create_with_tasks(&pool, &input).await.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_mission_tasks_mission_step"));
        }
        other => panic!("expected a database error, got {other:?}"),
    }

    assert_eq!(count(&pool, "missions").await, 0);
    assert_eq!(count(&pool, "mission_tasks").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_agent_reference_is_accepted(pool: PgPool) {
    let input = CreateMission {
        name: "Dangling".to_string(),
        tasks: vec![step(424_242, 1, None)],
    };
    let (_, tasks) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    assert_eq!(tasks[0].agent_id, 424_242);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tasks_are_listed_in_step_order(pool: PgPool) {
    let input = CreateMission {
        name: "Sparse".to_string(),
        tasks: vec![step(1, 30, None), step(1, 5, None), step(1, 17, None)],
    };
    let (mission, _) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();

    let steps: Vec<i32> = MissionTaskRepo::list_by_mission(&pool, mission.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.step_number)
        .collect();
    assert_eq!(steps, vec![5, 17, 30]);
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mission_transitions_are_guarded(pool: PgPool) {
    let input = CreateMission {
        name: "Guarded".to_string(),
        tasks: vec![],
    };
    let (mission, _) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();

    // pending -> complete is not a legal transition.
    assert!(!MissionRepo::mark_complete(&pool, mission.id).await.unwrap());

    assert!(MissionRepo::mark_running(&pool, mission.id).await.unwrap());
    assert!(!MissionRepo::mark_running(&pool, mission.id).await.unwrap());
    assert!(MissionRepo::mark_complete(&pool, mission.id).await.unwrap());

    // Terminal: nothing moves it again.
    assert!(!MissionRepo::mark_error(&pool, mission.id, "late").await.unwrap());

    let stored = MissionRepo::find_by_id(&pool, mission.id).await.unwrap().unwrap();
    assert_eq!(stored.status_id, MissionStatus::Complete.id());
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
    assert!(stored.error_message.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_lifecycle(pool: PgPool) {
    let input = CreateMission {
        name: "Lifecycle".to_string(),
        tasks: vec![step(1, 1, Some("A")), step(1, 2, None)],
    };
    let (_, tasks) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    let (first, second) = (&tasks[0], &tasks[1]);

    // Cannot complete a task that never started.
    assert!(!MissionTaskRepo::complete(&pool, first.id, "x").await.unwrap());

    assert!(MissionTaskRepo::start(&pool, first.id, "A").await.unwrap());
    assert!(MissionTaskRepo::complete(&pool, first.id, "X").await.unwrap());
    // Output is written exactly once.
    assert!(!MissionTaskRepo::complete(&pool, first.id, "Y").await.unwrap());

    assert!(MissionTaskRepo::start(&pool, second.id, "X").await.unwrap());
    assert!(MissionTaskRepo::fail(&pool, second.id, "boom").await.unwrap());
    assert!(!MissionTaskRepo::fail(&pool, second.id, "again").await.unwrap());

    let first = MissionTaskRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(first.status_id, TaskStatus::Complete.id());
    assert_eq!(first.output_data.as_deref(), Some("X"));

    let second = MissionTaskRepo::find_by_id(&pool, second.id).await.unwrap().unwrap();
    assert_eq!(second.status_id, TaskStatus::Error.id());
    assert_eq!(second.input_data.as_deref(), Some("X"));
    assert_eq!(second.output_data, None);
    assert_eq!(second.error_message.as_deref(), Some("boom"));
}

// ---------------------------------------------------------------------------
// Listing and recovery
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_missions_filters_by_status(pool: PgPool) {
    for name in ["M1", "M2", "M3"] {
        let input = CreateMission {
            name: name.to_string(),
            tasks: vec![],
        };
        MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    }
    let all = MissionRepo::list(&pool, &MissionListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name, "M3");

    MissionRepo::mark_running(&pool, all[0].id).await.unwrap();
    let running = MissionRepo::list(
        &pool,
        &MissionListQuery {
            status_id: Some(MissionStatus::Running.id()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(running.len(), 1);

    let page = MissionRepo::list(
        &pool,
        &MissionListQuery {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fail_orphaned_running(pool: PgPool) {
    let input = CreateMission {
        name: "Interrupted".to_string(),
        tasks: vec![step(1, 1, None), step(1, 2, None)],
    };
    let (mission, tasks) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    MissionRepo::mark_running(&pool, mission.id).await.unwrap();
    MissionTaskRepo::start(&pool, tasks[0].id, "").await.unwrap();

    let failed = MissionRepo::fail_orphaned_running(&pool, "restarted").await.unwrap();
    assert_eq!(failed, vec![mission.id]);

    let stored = MissionRepo::find_by_id(&pool, mission.id).await.unwrap().unwrap();
    assert_eq!(stored.status_id, MissionStatus::Error.id());
    assert_eq!(stored.error_message.as_deref(), Some("restarted"));

    let tasks = MissionTaskRepo::list_by_mission(&pool, mission.id).await.unwrap();
    assert_eq!(tasks[0].status_id, TaskStatus::Error.id());
    assert_eq!(tasks[1].status_id, TaskStatus::Pending.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pending_ids_skip_started_missions(pool: PgPool) {
    let input = CreateMission {
        name: "Queued".to_string(),
        tasks: vec![step(1, 1, None)],
    };
    let (first, _) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    let (started, _) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    let (last, _) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    MissionRepo::mark_running(&pool, started.id).await.unwrap();

    let pending = MissionRepo::pending_ids(&pool).await.unwrap();
    assert_eq!(pending, vec![first.id, last.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fail_running_tasks_for_one_mission(pool: PgPool) {
    let input = CreateMission {
        name: "Crashed".to_string(),
        tasks: vec![step(1, 1, None), step(1, 2, None)],
    };
    let (mission, tasks) = MissionRepo::create_with_tasks(&pool, &input).await.unwrap();
    MissionTaskRepo::start(&pool, tasks[0].id, "").await.unwrap();

    let updated = MissionTaskRepo::fail_running_for_mission(&pool, mission.id, "panicked")
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let tasks = MissionTaskRepo::list_by_mission(&pool, mission.id).await.unwrap();
    assert_eq!(tasks[0].status_id, TaskStatus::Error.id());
    assert_eq!(tasks[0].error_message.as_deref(), Some("panicked"));
    assert_eq!(tasks[1].status_id, TaskStatus::Pending.id());
}
