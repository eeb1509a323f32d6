// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn fake_backend_echoes_by_default() {
    let mut backend = FakeBackend::new("s-1");
    let reply = backend
        .send(CancellationToken::new(), "hello")
        .await
        .expect("send succeeds");
    assert_eq!(reply, "echo: hello");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn fake_backend_close_is_idempotent() {
    let mut backend = FakeBackend::new("s-1");
    backend.close().await.expect("first close succeeds");
    backend.close().await.expect("second close succeeds");
    assert!(backend.is_closed());
}

#[tokio::test]
async fn fake_backend_honors_custom_reply() {
    let mut backend = FakeBackend::new("s-1").with_reply(|msg| Ok(msg.to_uppercase()));
    let reply = backend.send(CancellationToken::new(), "hi").await.unwrap();
    assert_eq!(reply, "HI");
}

#[tokio::test]
async fn fake_backend_send_is_cancellation_responsive() {
    let mut backend = FakeBackend::new("s-1").with_delay(Duration::from_secs(30));
    let token = CancellationToken::new();
    let token_clone = token.clone();

    let handle = tokio::spawn(async move { backend.send(token_clone, "x").await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("send should return promptly after cancellation")
        .expect("join succeeds");
    assert!(result.is_err());
}
