//! Registry reload integration tests.

#[cfg(test)]
mod tests {
    use std::fs;

    use mds_client::ClientError;
    use mds_core::reload_registry;
    use serde_json::json;

    use crate::{TestServer, test_key};

    fn services_file(entries: &[(&str, u8)]) -> String {
        let services: Vec<_> = entries
            .iter()
            .map(|(id, seed)| {
                json!({
                    "id": id,
                    "name": format!("Service {id}"),
                    "public_key": test_key(*seed).public_key().to_base64(),
                })
            })
            .collect();
        json!({ "services": services }).to_string()
    }

    #[tokio::test]
    async fn test_should_apply_registry_changes_without_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        fs::write(&path, services_file(&[("svc-1", 1)])).unwrap();

        let server = TestServer::start(vec![]).await.unwrap();
        reload_registry(&path, &server.registry).unwrap();

        let first = server.client("svc-1", &test_key(1)).unwrap();
        let second = server.client("svc-2", &test_key(2)).unwrap();
        let sms = json!({"to": "+46700000000"});

        first.send_sms(&sms).await.unwrap();
        assert!(matches!(
            second.send_sms(&sms).await,
            Err(ClientError::Api { status: 401, .. })
        ));

        // Rotate: svc-1 removed, svc-2 added.
        fs::write(&path, services_file(&[("svc-2", 2)])).unwrap();
        assert_eq!(reload_registry(&path, &server.registry).unwrap(), 1);

        second.send_sms(&sms).await.unwrap();
        assert!(matches!(
            first.send_sms(&sms).await,
            Err(ClientError::Api { ref code, .. }) if code == "UNKNOWN_CLIENT"
        ));
    }

    #[tokio::test]
    async fn test_should_keep_serving_after_broken_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        fs::write(&path, services_file(&[("svc-1", 1)])).unwrap();

        let server = TestServer::start(vec![]).await.unwrap();
        reload_registry(&path, &server.registry).unwrap();

        fs::write(&path, "{ broken").unwrap();
        assert!(reload_registry(&path, &server.registry).is_err());

        let client = server.client("svc-1", &test_key(1)).unwrap();
        client.send_sms(&json!({"to": "+46700000000"})).await.unwrap();
    }
}
