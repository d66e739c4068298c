use std::fs;

use fedora_harvest::client::{HttpResponse, MockRepositoryClient};
use fedora_harvest::config::{Credentials, Settings};
use fedora_harvest::confirm::MockConfirmation;
use fedora_harvest::versions::{self, RetentionDecision};
use mockall::predicate;
use tempfile::tempdir;

fn settings(dir: &std::path::Path) -> Settings {
    Settings {
        fedora_path: "localhost".to_string(),
        port: 8080,
        request_timeout_secs: 5,
        default_dsid: "MODS".to_string(),
        destination_directory: dir.join("exports"),
        max_results: 50,
        log_file: dir.join("purge_log.txt"),
        credentials: Credentials {
            username: "fedoraAdmin".to_string(),
            password: "secret".to_string(),
        },
    }
}

fn history_page(stamps: &[&str]) -> HttpResponse {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><datastreamHistory xmlns="http://www.fedora.info/definitions/1/0/management/">"#,
    );
    for stamp in stamps {
        body.push_str(&format!(
            r#"<datastreamProfile pid="test:7" dsID="OBJ"><dsCreateDate>{stamp}</dsCreateDate></datastreamProfile>"#
        ));
    }
    body.push_str("</datastreamHistory>");
    HttpResponse {
        status: 200,
        content_type: Some("text/xml".to_string()),
        body: body.into_bytes(),
    }
}

#[tokio::test]
async fn an_unordered_history_purges_oldest_through_second_newest() {
    let dir = tempdir().expect("temp dir");
    let settings = settings(dir.path());

    let mut client = MockRepositoryClient::new();
    client
        .expect_get()
        .with(predicate::function(|url: &str| {
            url.contains("/objects/test:7/datastreams/OBJ/history?format=xml")
        }))
        .times(1)
        .returning(|_| {
            Ok(history_page(&[
                "2019-06-01T00:00:00.000Z",
                "2018-01-01T00:00:00.000Z",
                "2019-01-01T00:00:00.000Z",
            ]))
        });

    let decision = versions::history_of(&client, &settings, "test:7", "OBJ")
        .await
        .expect("history should parse");

    assert_eq!(
        decision,
        RetentionDecision::PurgeRange {
            start: "2018-01-01T00:00:00.000Z".to_string(),
            end: "2019-01-01T00:00:00.000Z".to_string(),
        }
    );
}

#[tokio::test]
async fn a_single_profile_history_is_never_deleted() {
    let dir = tempdir().expect("temp dir");
    let settings = settings(dir.path());

    let mut client = MockRepositoryClient::new();
    client
        .expect_get()
        .times(1)
        .returning(|_| Ok(history_page(&["2019-01-01T00:00:00.000Z"])));

    let decision = versions::history_of(&client, &settings, "test:7", "OBJ")
        .await
        .expect("history should parse");

    assert_eq!(decision, RetentionDecision::Unparseable);
}

#[tokio::test]
async fn a_missing_history_is_an_error_not_a_purge() {
    let dir = tempdir().expect("temp dir");
    let settings = settings(dir.path());

    let mut client = MockRepositoryClient::new();
    client.expect_get().times(1).returning(|_| {
        Ok(HttpResponse {
            status: 404,
            content_type: None,
            body: Vec::new(),
        })
    });

    let result = versions::history_of(&client, &settings, "test:7", "OBJ").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn declining_the_confirmation_issues_no_requests() {
    let dir = tempdir().expect("temp dir");
    let settings = settings(dir.path());

    let mut confirm = MockConfirmation::new();
    confirm.expect_confirm().times(1).return_const(false);

    // No expectations on the client: any request would panic the mock.
    let client = MockRepositoryClient::new();
    let pids = vec!["test:7".to_string(), "test:8".to_string()];

    versions::purge_all_but_newest(&client, &settings, &confirm, &pids, "OBJ")
        .await
        .expect("a declined purge is a clean exit");

    assert!(
        !settings.log_file.exists(),
        "no log should be written when the operator declines"
    );
}

#[tokio::test]
async fn a_confirmed_purge_deletes_the_window_and_logs_the_outcome() {
    let dir = tempdir().expect("temp dir");
    let settings = settings(dir.path());

    let mut confirm = MockConfirmation::new();
    confirm.expect_confirm().times(1).return_const(true);

    let mut client = MockRepositoryClient::new();
    client
        .expect_get()
        .times(1)
        .returning(|_| {
            Ok(history_page(&[
                "2018-01-01T00:00:00.000Z",
                "2019-01-01T00:00:00.000Z",
                "2019-06-01T00:00:00.000Z",
            ]))
        });
    client
        .expect_delete()
        .with(predicate::function(|url: &str| {
            url.contains("/objects/test:7/datastreams/OBJ?")
                && url.contains("startDT=2018-01-01T00:00:00.000Z")
                && url.contains("endDT=2019-01-01T00:00:00.000Z")
        }))
        .times(1)
        .returning(|_| Ok(200));

    let pids = vec!["test:7".to_string()];
    versions::purge_all_but_newest(&client, &settings, &confirm, &pids, "OBJ")
        .await
        .expect("purge should succeed");

    let log = fs::read_to_string(&settings.log_file).expect("log file should exist");
    assert!(
        log.contains("Purging OBJ on test:7 from 2018-01-01T00:00:00.000Z until 2019-01-01T00:00:00.000Z"),
        "log should record the purge window: {log}"
    );
}

#[tokio::test]
async fn a_failed_purge_logs_the_request_it_sent() {
    let dir = tempdir().expect("temp dir");
    let settings = settings(dir.path());

    let mut confirm = MockConfirmation::new();
    confirm.expect_confirm().times(1).return_const(true);

    let mut client = MockRepositoryClient::new();
    client
        .expect_get()
        .times(1)
        .returning(|_| {
            Ok(history_page(&[
                "2018-01-01T00:00:00.000Z",
                "2019-01-01T00:00:00.000Z",
            ]))
        });
    client.expect_delete().times(1).returning(|_| Ok(403));

    let pids = vec!["test:7".to_string()];
    versions::purge_all_but_newest(&client, &settings, &confirm, &pids, "OBJ")
        .await
        .expect("a per-identifier failure never fails the batch");

    let log = fs::read_to_string(&settings.log_file).expect("log file should exist");
    assert!(
        log.contains("Failed to purge OBJ on test:7 with 403."),
        "log should record the failure and status: {log}"
    );
    assert!(
        log.contains("startDT=2018-01-01T00:00:00.000Z"),
        "failure line should embed the failed request: {log}"
    );
}
