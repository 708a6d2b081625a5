//! Integration tests for the device against a real controller socket.
//!
//! A Tokio listener plays the Crowd Control controller. The device itself is
//! synchronous, so the test body calls it directly and yields to the runtime
//! between polls.

use std::sync::Once;
use std::time::Duration;

use crowdcontrol::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const BASE: u32 = 0x8000_0000;
const QUEUE_ADDR: u32 = BASE + 0x40;

const GIVE_STOCKS: &[u8] =
    br#"{"id":3,"code":"give_stocks_3","parameters":["player_2",3],"targets":[],"viewer":"sdk","type":1}"#;

static INIT_LOGGING: Once = Once::new();

fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(
                    std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()),
                )
                .init();
        }
    });
}

// =========================================================================
// Helpers
// =========================================================================

/// A game-side view of the device: guest memory plus the DMA calls.
struct Game {
    device: CrowdControlDevice,
    memory: FlatMemory,
}

impl Game {
    fn new(config: BridgeConfig) -> Self {
        Self {
            device: CrowdControlDevice::new(config),
            memory: FlatMemory::new(BASE, 0x100),
        }
    }

    fn write_status(&mut self, command: Command) {
        assert!(self.memory.write(BASE, &[command.byte(), 0, 0, 0]));
        let outcome = self.device.dma_write(&self.memory, BASE, 4);
        assert_eq!(outcome, WriteOutcome::Handled);
    }

    fn read_queue(&mut self) -> Vec<u16> {
        self.device
            .dma_read(&mut self.memory, QUEUE_ADDR, QUEUE_BYTES as u32);
        self.memory.as_slice()[0x40..0x40 + QUEUE_BYTES]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Reads until something other than NONE shows up.
    async fn read_until_request(&mut self) -> Vec<u16> {
        for _ in 0..200 {
            let slots = self.read_queue();
            if slots[0] != 1 {
                return slots;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no request reached the game");
    }
}

async fn start_controller() -> (TcpListener, BridgeConfig) {
    init_test_logging();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let config = BridgeConfig {
        controller_addr: listener.local_addr().expect("should have local addr"),
        ..BridgeConfig::default()
    };
    (listener, config)
}

async fn accept(listener: &TcpListener) -> TcpStream {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(2), listener.accept())
        .await
        .expect("device should dial the controller")
        .expect("should accept");
    stream
}

async fn send_request(controller: &mut TcpStream, request: &[u8]) {
    controller.write_all(request).await.expect("controller write");
    controller.write_all(b"\0").await.expect("controller write");
}

/// Reads one NUL-terminated acknowledgement.
async fn read_ack(controller: &mut TcpStream) -> serde_json::Value {
    let mut bytes = Vec::new();
    loop {
        let byte = controller.read_u8().await.expect("controller read");
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    serde_json::from_slice(&bytes).expect("ack should be json")
}

async fn try_read_ack(controller: &mut TcpStream) -> Option<serde_json::Value> {
    tokio::time::timeout(Duration::from_millis(20), read_ack(controller))
        .await
        .ok()
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_game_started_connects() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::GameStarted);
    let _controller = accept(&listener).await;

    assert!(game.device.session().is_connected());
    assert_eq!(game.device.session().phase(), SessionPhase::OutOfMatch);
}

#[tokio::test]
async fn test_game_started_without_controller_stays_disconnected() {
    let (listener, config) = start_controller().await;
    drop(listener);
    let mut game = Game::new(BridgeConfig {
        connect_timeout: Duration::from_millis(200),
        ..config
    });

    game.write_status(Command::GameStarted);
    assert!(!game.device.session().is_connected());
    assert_eq!(game.read_queue(), vec![0, 0, 0, 0, 0]);
}

#[tokio::test]
async fn test_match_started_with_no_request_reads_none() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::MatchStarted);
    let _controller = accept(&listener).await;

    assert_eq!(game.read_queue(), vec![1, 0, 0, 0, 0]);
}

#[tokio::test]
async fn test_request_in_match_is_granted_and_acknowledged() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::GameStarted);
    let mut controller = accept(&listener).await;
    game.write_status(Command::MatchStarted);

    send_request(&mut controller, GIVE_STOCKS).await;
    assert_eq!(game.read_until_request().await, vec![3, 2, 3, 0, 0]);

    game.write_status(Command::EffectSuccess);
    let ack = read_ack(&mut controller).await;
    assert_eq!(ack["id"], 3);
    assert_eq!(ack["status"], 0);
    assert_eq!(ack["message"], "Response sent from game");
}

#[tokio::test]
async fn test_request_outside_match_is_refused() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::GameStarted);
    let mut controller = accept(&listener).await;
    send_request(&mut controller, GIVE_STOCKS).await;

    let mut ack = None;
    for _ in 0..100 {
        assert_eq!(game.read_queue(), vec![1, 0, 0, 0, 0]);
        ack = try_read_ack(&mut controller).await;
        if ack.is_some() {
            break;
        }
    }
    let ack = ack.expect("refusal should be acknowledged");
    assert_eq!(ack["id"], 3);
    assert_eq!(ack["status"], 1);

    // Exactly one acknowledgement.
    assert_eq!(game.read_queue(), vec![1, 0, 0, 0, 0]);
    assert!(try_read_ack(&mut controller).await.is_none());
}

#[tokio::test]
async fn test_game_ended_disconnects() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::MatchStarted);
    let mut controller = accept(&listener).await;

    game.write_status(Command::GameEnded);
    assert!(!game.device.session().is_connected());

    // The controller may find the socket gone; either way nothing reaches
    // the game.
    let _ = controller.write_all(GIVE_STOCKS).await;
    for _ in 0..5 {
        assert_eq!(game.read_queue(), vec![0, 0, 0, 0, 0]);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // The controller sees the close.
    let mut buf = [0u8; 16];
    let n = tokio::time::timeout(Duration::from_secs(1), controller.read(&mut buf))
        .await
        .expect("close should be observed")
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_match_ended_stops_granting() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::MatchStarted);
    let mut controller = accept(&listener).await;
    game.write_status(Command::MatchEnded);
    game.write_status(Command::MatchEnded);
    assert!(!game.device.session().in_match());
    assert!(try_read_ack(&mut controller).await.is_none());

    send_request(&mut controller, GIVE_STOCKS).await;
    let mut ack = None;
    for _ in 0..100 {
        assert_eq!(game.read_queue()[0], 1);
        ack = try_read_ack(&mut controller).await;
        if ack.is_some() {
            break;
        }
    }
    assert_eq!(ack.expect("refusal should be acknowledged")["status"], 1);
}

#[tokio::test]
async fn test_malformed_request_reads_unknown() {
    let (listener, config) = start_controller().await;
    let mut game = Game::new(config);

    game.write_status(Command::MatchStarted);
    let mut controller = accept(&listener).await;

    send_request(&mut controller, br#"{"id":9,"code":"give_stocks","parameters":[]}"#).await;
    assert_eq!(game.read_until_request().await, vec![2, 0, 0, 0, 0]);

    // The game can still answer it.
    game.write_status(Command::EffectRetry);
    let ack = read_ack(&mut controller).await;
    assert_eq!(ack["id"], 9);
    assert_eq!(ack["status"], 3);
}
