//! Signature verification integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, Utc};
    use mds_auth::{FixedClock, RequestSigner, ServiceIdentity};
    use mds_client::{Client, ClientError};
    use serde_json::{Value, json};

    use crate::{TestServer, identity, test_key};

    fn email() -> Value {
        json!({"from": {"address": "a@example.com"}, "to": "b@example.com"})
    }

    fn api_code(err: ClientError) -> (u16, String) {
        match err {
            ClientError::Api { status, code, .. } => (status, code),
            other => panic!("expected API error, got {other}"),
        }
    }

    async fn raw_post(
        url: &str,
        headers: &[(&str, String)],
        body: &'static str,
    ) -> (u16, Value) {
        let mut request = reqwest::Client::new().post(format!("{url}/v3/email"));
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        let response = request.body(body).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_should_reject_signature_from_other_key() {
        let server = TestServer::start(vec![identity("svc-1", &test_key(1))])
            .await
            .unwrap();
        let impostor = server.client("svc-1", &test_key(2)).unwrap();

        let err = impostor.send_email(&email()).await.unwrap_err();
        assert_eq!(api_code(err), (401, "SIGNATURE_MISMATCH".to_owned()));
        assert!(server.outbox.messages().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_unknown_client() {
        let key = test_key(1);
        let server = TestServer::start(vec![identity("svc-1", &key)]).await.unwrap();
        let stranger = server.client("svc-9", &key).unwrap();

        let err = stranger.send_sms(&json!({"to": "+46"})).await.unwrap_err();
        assert_eq!(api_code(err), (401, "UNKNOWN_CLIENT".to_owned()));
    }

    #[tokio::test]
    async fn test_should_reject_stale_request() {
        let key = test_key(1);
        let server = TestServer::start(vec![identity("svc-1", &key)]).await.unwrap();

        let clock = Arc::new(FixedClock::new(Utc::now() - TimeDelta::seconds(301)));
        let signer = RequestSigner::new("svc-1", key).unwrap().with_clock(clock);
        let client = Client::with_signer(&server.url, signer).unwrap();

        let err = client.send_email(&email()).await.unwrap_err();
        assert_eq!(api_code(err), (401, "TIMESTAMP_OUT_OF_WINDOW".to_owned()));
    }

    #[tokio::test]
    async fn test_should_reject_missing_headers() {
        let server = TestServer::start(vec![]).await.unwrap();

        let (status, body) = raw_post(&server.url, &[], "{}").await;
        assert_eq!(status, 401);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "MISSING_HEADERS");
    }

    #[tokio::test]
    async fn test_should_reject_body_swapped_after_signing() {
        let key = test_key(1);
        let server = TestServer::start(vec![identity("svc-1", &key)]).await.unwrap();
        let signer = RequestSigner::new("svc-1", key).unwrap();
        let envelope = signer.sign("POST", "/v3/email", br#"{"to":"b@example.com"}"#);

        let headers = [
            ("x-client-id", envelope.client_id.clone()),
            ("x-timestamp", envelope.timestamp.clone()),
            ("authorization", envelope.authorization()),
        ];
        let (status, body) = raw_post(&server.url, &headers, r#"{"to":"evil@example.com"}"#).await;

        assert_eq!(status, 401);
        assert_eq!(body["error"]["code"], "SIGNATURE_MISMATCH");
    }

    #[tokio::test]
    async fn test_should_reject_authorization_without_prefix() {
        let key = test_key(1);
        let server = TestServer::start(vec![identity("svc-1", &key)]).await.unwrap();
        let envelope = RequestSigner::new("svc-1", key)
            .unwrap()
            .sign("POST", "/v3/email", b"{}");

        let headers = [
            ("x-client-id", envelope.client_id.clone()),
            ("x-timestamp", envelope.timestamp.clone()),
            ("authorization", format!("Bearer {}", envelope.signature)),
        ];
        let (status, body) = raw_post(&server.url, &headers, "{}").await;

        assert_eq!(status, 401);
        assert_eq!(body["error"]["code"], "MALFORMED_AUTH_HEADER");
    }

    #[tokio::test]
    async fn test_should_report_misconfigured_service_key() {
        let key = test_key(1);
        let server = TestServer::start(vec![ServiceIdentity::new("svc-1", "not-a-key")])
            .await
            .unwrap();
        let client = server.client("svc-1", &key).unwrap();

        let err = client.send_email(&email()).await.unwrap_err();
        assert_eq!(api_code(err), (500, "MISCONFIGURED_SERVICE_KEY".to_owned()));
    }

    #[tokio::test]
    async fn test_should_route_before_authenticating() {
        let server = TestServer::start(vec![]).await.unwrap();
        let http = reqwest::Client::new();

        let missing = http
            .post(format!("{}/v3/fax", server.url))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);

        let wrong_method = http
            .get(format!("{}/v3/email", server.url))
            .send()
            .await
            .unwrap();
        assert_eq!(wrong_method.status().as_u16(), 405);
        assert!(wrong_method.headers().contains_key("x-request-id"));
    }
}
