use kvrepl::{
    commands::CommandError,
    key_value_store::StoredValue,
    replication::getack_command,
    resp::RespValue,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_set_command() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_ok(
        TestUtils::set_command("grape", "pear"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let store_guard = env.get_store().await;
    let value = store_guard.peek("grape").unwrap();
    assert_eq!(value.data, StoredValue::String("pear".to_string()));
    assert_eq!(value.expiration, None);
}

#[tokio::test]
async fn test_handle_set_command_without_positive_expiration() {
    let mut env = TestEnv::new_master_server();

    for expiration in ["0", "-5"] {
        env.exec_command_ok(
            TestUtils::invalid_command(&["SET", "grape", "mango", "PX", expiration]),
            &TestUtils::client_address(41844),
            &TestUtils::expected_simple_string("OK"),
        )
        .await;

        assert_eq!(env.get_store().await.peek("grape").unwrap().expiration, None);
    }
}

#[tokio::test]
async fn test_handle_set_command_invalid() {
    let mut env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["SET", "grape"]),
            CommandError::InvalidSetCommand,
        ),
        (
            TestUtils::invalid_command(&["SET", "grape", "mango", "px"]),
            CommandError::InvalidSetCommand,
        ),
        (
            TestUtils::invalid_command(&["SET", "grape", "mango", "px", "soon"]),
            CommandError::InvalidSetCommandExpiration,
        ),
        (
            RespValue::Array(vec![
                RespValue::BulkString("SET".to_string()),
                RespValue::BulkString("grape".to_string()),
                RespValue::SimpleString("mango".to_string()),
            ]),
            CommandError::InvalidSetCommandValue,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }

    assert!(env.get_store().await.is_empty());
}

#[tokio::test]
async fn test_handle_set_command_propagates_to_replicas() {
    let mut env = TestEnv::new_master_server();
    let mut replica = env.register_replica(&TestUtils::client_address(50001)).await;

    let command = TestUtils::set_command("grape", "mango");
    let encoded = command.encode();

    env.exec_command_ok(
        command,
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    assert_eq!(replica.try_recv().unwrap(), encoded);
    assert_eq!(replica.try_recv().unwrap(), getack_command());
    assert!(replica.try_recv().is_err());

    assert_eq!(env.server.read().await.repl_offset, encoded.len() as u64);
}

#[tokio::test]
async fn test_handle_set_command_on_replica_is_not_propagated() {
    let mut env = TestEnv::new_replica_server();
    let mut replica = env.register_replica(&TestUtils::client_address(50001)).await;

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    assert!(replica.try_recv().is_err());
    assert_eq!(env.server.read().await.repl_offset, 0);
}

#[tokio::test]
async fn test_failed_set_command_is_not_propagated() {
    let mut env = TestEnv::new_master_server();
    let mut replica = env.register_replica(&TestUtils::client_address(50001)).await;

    env.exec_command_err(
        TestUtils::invalid_command(&["SET", "grape"]),
        &TestUtils::client_address(41844),
        CommandError::InvalidSetCommand,
    )
    .await;

    assert!(replica.try_recv().is_err());
    assert_eq!(env.server.read().await.repl_offset, 0);
}
