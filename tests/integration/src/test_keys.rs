//! Key encoding integration tests.
//!
//! Clients and the registry may hold keys in any supported encoding; the
//! signatures must verify regardless of which pair of encodings is used.

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use ed25519_dalek::SigningKey;
    use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
    use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
    use mds_auth::ServiceIdentity;
    use mds_client::Client;
    use serde_json::json;
    use ssh_key::private::Ed25519Keypair;

    use crate::TestServer;

    const SEED: [u8; 32] = [42; 32];

    fn private_encodings() -> Vec<(&'static str, String)> {
        let signing = SigningKey::from_bytes(&SEED);
        let openssh = ssh_key::PrivateKey::from(Ed25519Keypair::from_seed(&SEED))
            .to_openssh(ssh_key::LineEnding::LF)
            .unwrap()
            .to_string();
        let pem = signing.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();

        vec![
            ("base64 seed", STANDARD.encode(SEED)),
            ("base64 keypair", STANDARD.encode(signing.to_keypair_bytes())),
            ("pkcs8 pem", pem.clone()),
            ("base64 pkcs8 pem", STANDARD.encode(&pem)),
            ("openssh", openssh),
        ]
    }

    fn public_encodings() -> Vec<(&'static str, String)> {
        let verifying = SigningKey::from_bytes(&SEED).verifying_key();
        let openssh = ssh_key::PrivateKey::from(Ed25519Keypair::from_seed(&SEED))
            .public_key()
            .to_openssh()
            .unwrap();

        vec![
            ("raw base64", STANDARD.encode(verifying.to_bytes())),
            ("pkix pem", verifying.to_public_key_pem(LineEnding::LF).unwrap()),
            ("openssh line", openssh.clone()),
            ("base64 openssh line", STANDARD.encode(openssh)),
        ]
    }

    #[tokio::test]
    async fn test_should_verify_across_key_encodings() {
        let services = public_encodings()
            .into_iter()
            .map(|(label, key)| ServiceIdentity::new(label.replace(' ', "-"), key))
            .collect();
        let server = TestServer::start(services).await.unwrap();

        for (public_label, _) in public_encodings() {
            let client_id = public_label.replace(' ', "-");
            for (private_label, private_key) in private_encodings() {
                let client = Client::new(&server.url, client_id.as_str(), private_key).unwrap();
                let result = client
                    .send_sms(&json!({"to": "+46700000000", "content": {"body": "hi"}}))
                    .await;
                assert!(
                    result.is_ok(),
                    "{private_label} -> {public_label}: {:?}",
                    result.err()
                );
            }
        }

        assert_eq!(
            server.outbox.messages().len(),
            public_encodings().len() * private_encodings().len()
        );
    }
}
