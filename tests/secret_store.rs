//! Secret Manager REST client against a local stand-in.

mod common;

use antigravity_proxy::credential::{
    CredentialError, CredentialProvider, CredentialSource, CredentialSources, GcpSecretManager,
    SecretStore,
};
use common::{start_secret_manager_mock, SECRET_TOKEN};

fn sources(secret: &str) -> CredentialSources {
    CredentialSources {
        project_id: Some("p".into()),
        secret_name: secret.into(),
        env_value: Some("from-env".into()),
        placeholder: "YOUR_API_KEY_HERE".into(),
    }
}

async fn store() -> GcpSecretManager {
    let addr = start_secret_manager_mock().await;
    GcpSecretManager::with_endpoint(format!("http://{addr}/v1"), SECRET_TOKEN)
}

#[tokio::test]
async fn payload_is_decoded_and_trimmed() {
    let store = store().await;

    let raw = store
        .access_secret_version("projects/p/secrets/s/versions/latest")
        .await
        .unwrap();
    assert_eq!(raw, b"AIzaFromSecret\n");

    let resolved = CredentialProvider::new(&store)
        .resolve(&sources("s"))
        .await
        .unwrap();
    assert_eq!(resolved.source, CredentialSource::SecretManager);
    assert_eq!(resolved.credential.expose(), "AIzaFromSecret");
}

#[tokio::test]
async fn forbidden_is_fatal_and_never_falls_back() {
    let store = store().await;

    let result = CredentialProvider::new(&store).resolve(&sources("denied")).await;

    match result {
        Err(CredentialError::Status { status, name, message }) => {
            assert_eq!(status, 403);
            assert_eq!(name, "projects/p/secrets/denied/versions/latest");
            assert!(message.contains("PERMISSION_DENIED"));
        }
        other => panic!("expected 403 status error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_payload_is_rejected() {
    let store = store().await;

    let result = CredentialProvider::new(&store).resolve(&sources("empty")).await;
    assert!(matches!(result, Err(CredentialError::MissingPayload(_))));
}

#[tokio::test]
async fn wrong_token_is_a_status_error() {
    let addr = start_secret_manager_mock().await;
    let store = GcpSecretManager::with_endpoint(format!("http://{addr}/v1/"), "stale-token");

    let result = store
        .access_secret_version("projects/p/secrets/s/versions/latest")
        .await;
    assert!(matches!(result, Err(CredentialError::Status { status: 401, .. })));
}
