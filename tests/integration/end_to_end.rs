//! End-to-end tests: real chat sessions talking through an in-process hub.
//!
//! Each test starts a `morsechat-relay` hub on an ephemeral port, connects
//! real [`RelayTransport`]s, and drives [`ChatSession`]s over them. Verifies:
//! 1. "SOS" arrives as `{morse: "... --- ...", text: "SOS"}` at the peer and
//!    as an echo at the sender.
//! 2. Unsupported characters are dropped from the Morse but kept in the text.
//! 3. A receiver with the wrong key gets a decryption error and stays usable.
//! 4. The hub only ever sees ciphertext.

use std::sync::Arc;
use std::time::Duration;

use morsechat::chat::{ChatEntry, ChatError, ChatSession, Direction};
use morsechat::cipher::{CipherError, SharedKeyCipher};
use morsechat::transport::relay::RelayTransport;
use morsechat::transport::{Transport, TransportError};
use morsechat_relay::hub::{self, HubState};

type Session = ChatSession<SharedKeyCipher, RelayTransport>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn start_hub() -> String {
    let (addr, _handle) = hub::start_server_with_state("127.0.0.1:0", Arc::new(HubState::new()))
        .await
        .unwrap();
    format!("ws://{addr}/ws")
}

async fn join(url: &str, key: &str) -> Session {
    let transport = RelayTransport::connect(url).await.unwrap();
    ChatSession::new(SharedKeyCipher::from_passphrase(key).unwrap(), transport)
}

async fn receive(session: &Session) -> Result<ChatEntry, ChatError> {
    tokio::time::timeout(Duration::from_secs(5), session.receive_one())
        .await
        .expect("receive timed out")
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn sos_reaches_peer_and_echoes_to_sender() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let bob = join(&url, "shared").await;

    let sent = alice.send_text("SOS").await.unwrap().unwrap();
    assert_eq!(sent.direction, Direction::Outgoing);
    assert_eq!(sent.morse, "... --- ...");

    let at_bob = receive(&bob).await.unwrap();
    assert_eq!(at_bob.direction, Direction::Incoming);
    assert_eq!(at_bob.morse, "... --- ...");
    assert_eq!(at_bob.text, "SOS");

    let echo = receive(&alice).await.unwrap();
    assert_eq!(echo.morse, "... --- ...");
    assert_eq!(echo.text, "SOS");

    let alice_log = alice.history();
    assert_eq!(alice_log.len(), 2);
    assert_eq!(alice_log.outgoing().count(), 1);
    assert_eq!(alice_log.incoming().count(), 1);
    assert_eq!(bob.history().len(), 1);
}

#[tokio::test]
async fn lowercase_input_is_uppercased_in_morse_only() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let bob = join(&url, "shared").await;

    alice.send_text("hello world").await.unwrap();
    let entry = receive(&bob).await.unwrap();

    assert_eq!(entry.morse, ".... . .-.. .-.. --- / .-- --- .-. .-.. -..");
    assert_eq!(entry.text, "hello world");
    assert_eq!(morsechat_proto::morse::decode(&entry.morse), "HELLO WORLD");
}

#[tokio::test]
async fn unsupported_characters_are_lossy() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let bob = join(&url, "shared").await;

    alice.send_text("SOS!").await.unwrap();
    let entry = receive(&bob).await.unwrap();

    assert_eq!(entry.morse, "... --- ...");
    assert_eq!(entry.morse.split(' ').count(), 3);
    assert_eq!(entry.text, "SOS!");
}

#[tokio::test]
async fn wrong_key_receiver_gets_decryption_error() {
    let url = start_hub().await;
    let alice = join(&url, "right key").await;
    let eve = join(&url, "wrong key").await;

    alice.send_text("SECRET").await.unwrap();

    let err = receive(&eve).await.unwrap_err();
    assert!(matches!(err, ChatError::Cipher(CipherError::Decryption(_))));
    assert!(eve.is_empty());

    // Eve's session survives and still handles her own traffic.
    eve.send_text("MINE").await.unwrap();
    let own = receive(&eve).await.unwrap();
    assert_eq!(own.text, "MINE");
}

#[tokio::test]
async fn blank_input_sends_nothing() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let bob = join(&url, "shared").await;

    assert!(alice.send_text("   ").await.unwrap().is_none());
    alice.send_text("K").await.unwrap();

    let entry = receive(&bob).await.unwrap();
    assert_eq!(entry.text, "K");
}

#[tokio::test]
async fn conversation_order_is_preserved() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let bob = join(&url, "shared").await;

    for word in ["ONE", "TWO", "THREE"] {
        alice.send_text(word).await.unwrap();
    }
    for word in ["ONE", "TWO", "THREE"] {
        assert_eq!(receive(&bob).await.unwrap().text, word);
    }
}

#[tokio::test]
async fn hub_only_sees_ciphertext() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let observer = RelayTransport::connect(&url).await.unwrap();

    alice.send_text("SOS").await.unwrap();

    let raw = tokio::time::timeout(Duration::from_secs(5), observer.recv())
        .await
        .expect("recv timed out")
        .unwrap();
    assert!(!raw.contains("SOS"));
    assert!(!raw.contains("... --- ..."));
    assert!(!raw.contains('|'));
}

#[tokio::test]
async fn peer_leaving_does_not_break_the_chat() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;
    let bob = join(&url, "shared").await;
    let carol = join(&url, "shared").await;

    carol.transport().close().await;
    drop(carol);

    alice.send_text("STILL HERE").await.unwrap();
    assert_eq!(receive(&bob).await.unwrap().text, "STILL HERE");
}

#[tokio::test]
async fn closed_session_reports_disconnect() {
    let url = start_hub().await;
    let alice = join(&url, "shared").await;

    alice.transport().close().await;

    let err = alice.send_text("LATE").await.unwrap_err();
    assert!(matches!(
        err,
        ChatError::Transport(TransportError::ConnectionClosed)
    ));
    assert!(err.is_disconnect());
}
