use std::{sync::Arc, time::Duration};

use kvrepl::{
    commands::{CommandError, CommandHandler, CommandResult},
    replication::getack_command,
};
use tokio::time::Instant;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_wait_command_without_replicas() {
    let mut env = TestEnv::new_master_server();

    for (number_of_replicas, timeout) in [(0, 0), (0, 500), (1, 0)] {
        env.exec_command_ok(
            TestUtils::wait_command(number_of_replicas, timeout),
            &TestUtils::client_address(41844),
            &TestUtils::expected_integer(0),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_wait_command_broadcasts_getack() {
    let mut env = TestEnv::new_master_server();
    let mut replica = env.register_replica(&TestUtils::client_address(50001)).await;

    env.exec_command_ok(
        TestUtils::wait_command(1, 0),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(1),
    )
    .await;

    assert_eq!(replica.try_recv().unwrap(), getack_command());
}

#[tokio::test]
async fn test_handle_wait_command_returns_when_enough_replicas_ack() {
    tokio::time::pause();

    let mut env = TestEnv::new_master_server();
    let first = TestUtils::client_address(50001);
    let second = TestUtils::client_address(50002);
    let _first_replica = env.register_replica(&first).await;
    let _second_replica = env.register_replica(&second).await;

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let start = Instant::now();
    let wait_task = spawn_wait(&env, 2, 5000);

    tokio::time::sleep(Duration::from_millis(10)).await;
    env.replicas.lock().await.acknowledge(&first, 31);
    tokio::time::sleep(Duration::from_millis(10)).await;
    env.replicas.lock().await.acknowledge(&second, 31);

    let result = wait_task.await.unwrap();

    assert_eq!(
        result,
        Ok(CommandResult::Response(TestUtils::expected_integer(2)))
    );
    assert!(start.elapsed() < Duration::from_millis(5000));
}

#[tokio::test]
async fn test_handle_wait_command_times_out_with_partial_acks() {
    tokio::time::pause();

    let mut env = TestEnv::new_master_server();
    let first = TestUtils::client_address(50001);
    let _first_replica = env.register_replica(&first).await;
    let _second_replica = env.register_replica(&TestUtils::client_address(50002)).await;
    let _third_replica = env.register_replica(&TestUtils::client_address(50003)).await;

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let start = Instant::now();
    let wait_task = spawn_wait(&env, 3, 500);

    tokio::time::sleep(Duration::from_millis(10)).await;
    env.replicas.lock().await.acknowledge(&first, 31);

    let result = wait_task.await.unwrap();

    assert_eq!(
        result,
        Ok(CommandResult::Response(TestUtils::expected_integer(1)))
    );
    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_handle_wait_command_invalid() {
    let mut env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["WAIT", "1"]),
            CommandError::InvalidWaitCommand,
        ),
        (
            TestUtils::invalid_command(&["WAIT", "one", "100"]),
            CommandError::InvalidWaitCommandArgument,
        ),
        (
            TestUtils::invalid_command(&["WAIT", "1", "-100"]),
            CommandError::InvalidWaitCommandArgument,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}

fn spawn_wait(
    env: &TestEnv,
    number_of_replicas: u32,
    timeout_ms: u64,
) -> tokio::task::JoinHandle<Result<CommandResult, CommandError>> {
    let server = Arc::clone(&env.server);
    let store = Arc::clone(&env.store);
    let replicas = Arc::clone(&env.replicas);
    let command = TestUtils::wait_command(number_of_replicas, timeout_ms);

    tokio::spawn(async move {
        let command_handler = CommandHandler::new(TestUtils::message(command))?;

        command_handler
            .handle_command(&TestUtils::client_address(41844), server, store, replicas)
            .await
    })
}
