//! Server Tests
//!
//! Tests verify:
//! - Request/response round trips over TCP
//! - Status codes for missing keys
//! - Malformed requests get an ERROR response
//! - Shutdown stops the accept loop

use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use segkv::config::{Config, WalSyncStrategy};
use segkv::network::{Server, ShutdownHandle};
use segkv::protocol::{read_response, write_command, Command, Response, Status};
use segkv::Engine;
use tempfile::TempDir;

struct TestServer {
    _temp_dir: TempDir,
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::builder()
            .data_dir(temp_dir.path())
            .wal_sync_strategy(WalSyncStrategy::EveryWrite)
            .listen_addr("127.0.0.1:0")
            .read_timeout_ms(5000)
            .build();
        let engine = Arc::new(Engine::open(config.clone()).unwrap());
        let server = Server::bind(config, engine).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.run().unwrap());

        Self {
            _temp_dir: temp_dir,
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    fn connect(&self) -> Client {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        Client {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    fn send(&mut self, command: Command) -> Response {
        write_command(&mut self.writer, &command).unwrap();
        read_response(&mut self.reader).unwrap()
    }
}

#[test]
fn test_ping() {
    let server = TestServer::start();
    let mut client = server.connect();

    let response = client.send(Command::Ping);

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.payload, Some(b"PONG".to_vec()));
}

#[test]
fn test_set_get_delete_round_trip() {
    let server = TestServer::start();
    let mut client = server.connect();

    let set = client.send(Command::Set {
        key: b"city".to_vec(),
        value: b"Lisbon".to_vec(),
    });
    assert_eq!(set.status, Status::Ok);
    assert_eq!(set.payload, None);

    let get = client.send(Command::Get {
        key: b"city".to_vec(),
    });
    assert_eq!(get.status, Status::Ok);
    assert_eq!(get.payload, Some(b"Lisbon".to_vec()));

    let delete = client.send(Command::Delete {
        key: b"city".to_vec(),
    });
    assert_eq!(delete.status, Status::Ok);
    assert_eq!(delete.payload, Some(b"Lisbon".to_vec()));

    let gone = client.send(Command::Get {
        key: b"city".to_vec(),
    });
    assert_eq!(gone.status, Status::NotFound);
}

#[test]
fn test_missing_key_statuses() {
    let server = TestServer::start();
    let mut client = server.connect();

    let get = client.send(Command::Get { key: b"nope".to_vec() });
    assert_eq!(get.status, Status::NotFound);

    let delete = client.send(Command::Delete { key: b"nope".to_vec() });
    assert_eq!(delete.status, Status::NotFound);
}

#[test]
fn test_clients_share_engine() {
    let server = TestServer::start();
    let mut writer = server.connect();
    let mut reader = server.connect();

    writer.send(Command::Set {
        key: b"shared".to_vec(),
        value: b"yes".to_vec(),
    });
    let response = reader.send(Command::Get {
        key: b"shared".to_vec(),
    });

    assert_eq!(response.payload, Some(b"yes".to_vec()));
}

#[test]
fn test_malformed_request_gets_error() {
    let server = TestServer::start();
    let mut client = server.connect();

    client
        .writer
        .write_all(&[0x7F, 0x00, 0x00, 0x00, 0x00])
        .unwrap();
    let response = read_response(&mut client.reader).unwrap();

    assert_eq!(response.status, Status::Error);
    assert!(response.payload.is_some());
}

#[test]
fn test_connection_limit() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .listen_addr("127.0.0.1:0")
        .max_connections(1)
        .build();
    let engine = Arc::new(Engine::open(config.clone()).unwrap());
    let server = Arc::new(Server::bind(config, engine).unwrap());
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let runner = {
        let server = Arc::clone(&server);
        thread::spawn(move || server.run().unwrap())
    };

    let mut first = BufReader::new(TcpStream::connect(addr).unwrap());
    write_command(first.get_mut(), &Command::Ping).unwrap();
    assert_eq!(read_response(&mut first).unwrap().status, Status::Ok);
    assert_eq!(server.active_connections(), 1);

    let mut second = BufReader::new(TcpStream::connect(addr).unwrap());
    second
        .get_ref()
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let rejected = read_response(&mut second).unwrap();
    assert_eq!(rejected.status, Status::Error);

    shutdown.shutdown();
    runner.join().unwrap();
}

#[test]
fn test_shutdown_stops_server() {
    let mut server = TestServer::start();

    server.shutdown.shutdown();
    server.handle.take().unwrap().join().unwrap();
}
