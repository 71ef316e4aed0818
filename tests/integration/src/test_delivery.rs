//! Message acceptance integration tests.

#[cfg(test)]
mod tests {
    use mds_client::ClientError;
    use mds_server::OutboundMessage;
    use serde_json::json;

    use crate::{TestServer, identity, test_key};

    #[tokio::test]
    async fn test_should_accept_signed_email() {
        let key = test_key(1);
        let server = TestServer::start(vec![identity("svc-1", &key)]).await.unwrap();
        let client = server.client("svc-1", &key).unwrap();

        let accepted = client
            .send_email(&json!({
                "from": {"address": "support@example.com", "name": "Support"},
                "to": [{"address": "user@example.com"}],
                "subject": "Welcome",
                "content": {"body": "<h1>Hi</h1>", "isHtml": true},
            }))
            .await
            .unwrap();

        assert!(accepted.success);
        assert_eq!(accepted.message, "Email accepted for delivery");

        let messages = server.outbox.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(accepted.id.as_deref(), Some(messages[0].id()));
        match &messages[0] {
            OutboundMessage::Email {
                client_id,
                from,
                to,
                subject,
                ..
            } => {
                assert_eq!(client_id, "svc-1");
                assert_eq!(from, "support@example.com");
                assert_eq!(to, &vec!["user@example.com".to_owned()]);
                assert_eq!(subject, "Welcome");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_accept_signed_sms() {
        let key = test_key(2);
        let server = TestServer::start(vec![identity("svc-2", &key)]).await.unwrap();
        let client = server.client("svc-2", &key).unwrap();

        let accepted = client
            .send_sms(&json!({
                "senderName": "Acme",
                "to": ["+46700000000", "+46700000001"],
                "content": {"template": {"name": "otp", "data": {"code": "1234"}}},
            }))
            .await
            .unwrap();

        assert_eq!(accepted.message, "SMS accepted for delivery");
        match &server.outbox.messages()[0] {
            OutboundMessage::Sms { to, body, .. } => {
                assert_eq!(to.len(), 2);
                assert!(body.starts_with("Template: otp"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_reject_message_without_recipients() {
        let key = test_key(3);
        let server = TestServer::start(vec![identity("svc-3", &key)]).await.unwrap();
        let client = server.client("svc-3", &key).unwrap();

        let err = client
            .send_email(&json!({"from": {"address": "a@example.com"}, "to": []}))
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, 400);
                assert_eq!(code, "NO_RECIPIENTS");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(server.outbox.messages().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_invalid_body_after_authentication() {
        let key = test_key(4);
        let server = TestServer::start(vec![identity("svc-4", &key)]).await.unwrap();
        let client = server.client("svc-4", &key).unwrap();

        let err = client
            .send_email(&json!({"subject": "missing sender"}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Api { status: 400, ref code, .. } if code == "INVALID_BODY"
        ));
    }

    #[tokio::test]
    async fn test_should_report_health_without_signature() {
        let key = test_key(5);
        let server = TestServer::start(vec![]).await.unwrap();
        let client = server.client("nobody", &key).unwrap();

        let health = client.health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert!(health.timestamp.ends_with('Z'));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_accept_concurrent_clients() {
        let keys: Vec<_> = (10..30).map(test_key).collect();
        let services = keys
            .iter()
            .enumerate()
            .map(|(i, key)| identity(&format!("svc-{i}"), key))
            .collect();
        let server = TestServer::start(services).await.unwrap();

        let sends = keys.iter().enumerate().map(|(i, key)| {
            let client = server.client(&format!("svc-{i}"), key).unwrap();
            async move {
                client
                    .send_sms(&json!({"to": "+46700000000", "content": {"body": format!("n{i}")}}))
                    .await
            }
        });

        let results = futures::future::join_all(sends).await;
        assert!(results.iter().all(Result::is_ok), "{results:?}");
        assert_eq!(server.outbox.messages().len(), keys.len());
    }
}
