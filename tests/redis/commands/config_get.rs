use kvrepl::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_config_get_command() {
    let mut env = TestEnv::new_master_server();

    let test_cases = vec![
        ("dir", TestUtils::expected_bulk_string_array(&["dir", "/tmp/redis-files"])),
        ("DIR", TestUtils::expected_bulk_string_array(&["dir", "/tmp/redis-files"])),
        (
            "dbfilename",
            TestUtils::expected_bulk_string_array(&["dbfilename", "dump.rdb"]),
        ),
    ];

    for (name, expected) in test_cases {
        env.exec_command_ok(
            TestUtils::config_get_command(name),
            &TestUtils::client_address(41844),
            &expected,
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_config_get_command_lowercase() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::invalid_command(&["config", "get", "dir"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_bulk_string_array(&["dir", "/tmp/redis-files"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_config_get_command_invalid() {
    let mut env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::config_get_command("port"),
            CommandError::InvalidConfigGetCommandArgument,
        ),
        (
            TestUtils::invalid_command(&["CONFIG", "GET"]),
            CommandError::InvalidConfigGetCommand,
        ),
        (
            TestUtils::invalid_command(&["CONFIG", "GET", "dir", "dbfilename"]),
            CommandError::InvalidConfigGetCommand,
        ),
        (
            TestUtils::invalid_command(&["CONFIG", "SET", "dir", "/tmp"]),
            CommandError::InvalidConfigGetCommand,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
