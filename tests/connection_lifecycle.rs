//! Connection lifecycle integration tests.
//!
//! Registration, keepalive, unknown/unregistered commands and QUIT.

mod common;

use common::TestServer;

#[tokio::test]
async fn test_registration_welcome_burst() {
    let server = TestServer::spawn(17101).await.expect("spawn");
    let mut client = server.connect("alice").await.expect("connect");

    let burst = client.register().await.expect("register");
    let verbs: Vec<&str> = burst.iter().map(|m| m.verb.as_str()).collect();
    assert_eq!(verbs, ["001", "002", "003", "004", "005"]);

    let welcome = &burst[0];
    assert_eq!(welcome.source.as_deref(), Some("test.server"));
    assert_eq!(welcome.arg(0), Some("alice"));
    assert!(welcome.arg(1).unwrap().contains("TestNet"));

    let isupport = &burst[4];
    assert!(isupport.params.iter().any(|p| p == "PREFIX=(ov)@+"));
    assert!(isupport.params.iter().any(|p| p == "MAXLIST=beI:4"));
}

#[tokio::test]
async fn test_ping_pong() {
    let server = TestServer::spawn(17102).await.expect("spawn");
    let mut client = server.connect("bob").await.expect("connect");

    // PING works before registration.
    client.send_raw("PING :token-1").await.unwrap();
    let pong = client.expect_verb("PONG").await.unwrap();
    assert_eq!(pong.params, ["test.server", "token-1"]);

    client.register().await.unwrap();
    client.send_raw("PING token-2").await.unwrap();
    let pong = client.expect_verb("PONG").await.unwrap();
    assert_eq!(pong.arg(1), Some("token-2"));
}

#[tokio::test]
async fn test_commands_before_registration() {
    let server = TestServer::spawn(17103).await.expect("spawn");
    let mut client = server.connect("carol").await.expect("connect");

    client.send_raw("JOIN #rust").await.unwrap();
    let reply = client.recv().await.unwrap();
    assert_eq!(reply.verb, "451");
    assert_eq!(reply.arg(0), Some("*"));

    client.send_raw("FROBNICATE").await.unwrap();
    let reply = client.recv().await.unwrap();
    assert_eq!(reply.verb, "421");
    assert_eq!(reply.arg(1), Some("FROBNICATE"));
}

#[tokio::test]
async fn test_registered_errors() {
    let server = TestServer::spawn(17104).await.expect("spawn");
    let mut client = server.connect("dave").await.expect("connect");
    client.register().await.unwrap();

    client.send_raw("USER again 0 * :again").await.unwrap();
    assert_eq!(client.recv().await.unwrap().verb, "462");

    client.send_raw("JOIN").await.unwrap();
    let reply = client.recv().await.unwrap();
    assert_eq!(reply.verb, "461");
    assert_eq!(reply.arg(1), Some("JOIN"));

    client.send_raw("NOSUCHVERB x").await.unwrap();
    assert_eq!(client.recv().await.unwrap().verb, "421");

    // A blank line is dropped without a reply.
    client.send_raw("").await.unwrap();
    client.send_raw("PING after-blank").await.unwrap();
    assert_eq!(client.recv().await.unwrap().verb, "PONG");
}

#[tokio::test]
async fn test_nick_collision_is_case_insensitive() {
    let server = TestServer::spawn(17105).await.expect("spawn");
    let mut first = server.connect("Erin[x]").await.expect("connect");
    first.register().await.unwrap();

    let mut second = server.connect("other").await.expect("connect");
    second.send_raw("NICK erin{X}").await.unwrap();
    let reply = second.recv().await.unwrap();
    assert_eq!(reply.verb, "433");
    assert_eq!(reply.arg(1), Some("erin{X}"));
}

#[tokio::test]
async fn test_quit_closes_link_and_notifies_peers() {
    let server = TestServer::spawn(17106).await.expect("spawn");
    let mut alice = server.connect("alice").await.expect("connect");
    let mut bob = server.connect("bob").await.expect("connect");
    alice.register().await.unwrap();
    bob.register().await.unwrap();

    alice.send_raw("JOIN #lobby").await.unwrap();
    alice.expect_verb("366").await.unwrap();
    bob.send_raw("JOIN #lobby").await.unwrap();
    bob.expect_verb("366").await.unwrap();
    alice.expect_verb("JOIN").await.unwrap();

    let error = bob.quit(Some("bye now")).await.unwrap();
    assert_eq!(error.arg(0), Some("Closing Link: 127.0.0.1 (Quit: bye now)"));

    let quit = alice.expect_verb("QUIT").await.unwrap();
    assert_eq!(quit.source_nickname(), Some("bob"));
    assert_eq!(quit.arg(0), Some("Quit: bye now"));
}
