//! End-to-end tests: a real server on an ephemeral port and plain TCP clients.

use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tcp_chat::message::NAME_PROMPT;
use tcp_chat::{Config, Room, Server};
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);
const BANNER: &str = "Welcome to TCP-Chat!\r\n  _nnnn_\n";

struct TestServer {
    addr: SocketAddr,
    room: Arc<Room>,
    _banner: NamedTempFile,
}

async fn start_server() -> TestServer {
    let mut banner = NamedTempFile::new().unwrap();
    banner.write_all(BANNER.as_bytes()).unwrap();

    let config = Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        banner_path: banner.path().to_path_buf(),
        keepalive: None,
    };
    let server = Server::bind(config).await.expect("bind");
    let addr = server.local_addr().unwrap();
    let room = server.room();
    tokio::spawn(server.run());

    TestServer {
        addr,
        room,
        _banner: banner,
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connect, check the greeting and prompt, and send `name`.
    async fn join(addr: SocketAddr, name: &str) -> Self {
        let stream = timeout(TEST_TIMEOUT, TcpStream::connect(addr))
            .await
            .expect("connect in time")
            .expect("connect");
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
        };

        assert_eq!(client.recv().await, "Welcome to TCP-Chat!\n");
        assert_eq!(client.recv().await, "  _nnnn_\n");

        let mut prompt = vec![0; NAME_PROMPT.len()];
        timeout(TEST_TIMEOUT, client.reader.read_exact(&mut prompt))
            .await
            .expect("prompt in time")
            .unwrap();
        assert_eq!(prompt, NAME_PROMPT.as_bytes());

        client.send(name).await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(TEST_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("line in time")
            .unwrap();
        assert!(n > 0, "connection closed");
        line
    }
}

async fn wait_online(room: &Room, count: usize) {
    timeout(TEST_TIMEOUT, async {
        while room.online().await != count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("registry settles");
}

async fn wait_history(room: &Room, count: usize) {
    timeout(TEST_TIMEOUT, async {
        while room.history().len().await != count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("history settles");
}

fn assert_chat(line: &str, name: &str, body: &str) {
    // [YYYY-MM-DD HH:MM:SS][name]: body
    assert_eq!(&line[..1], "[");
    assert_eq!(&line[20..21], "]");
    assert_eq!(&line[21..], format!("[{name}]: {body}\n"), "{line}");
}

#[tokio::test]
async fn two_clients_chat_and_leave() {
    let server = start_server().await;

    let mut a = Client::join(server.addr, "A").await;
    wait_online(&server.room, 1).await;

    let mut b = Client::join(server.addr, "B").await;
    assert_eq!(a.recv().await, "B has joined the chat\n");

    a.send("hi").await;
    assert_chat(&b.recv().await, "A", "hi");

    // A's next line is B's reply, so "hi" was never echoed back to A.
    b.send("hey").await;
    assert_chat(&a.recv().await, "B", "hey");

    drop(b);
    assert_eq!(a.recv().await, "B has left the chat\n");
    wait_online(&server.room, 1).await;
}

#[tokio::test]
async fn late_joiner_gets_history_in_order() {
    let server = start_server().await;

    let mut a = Client::join(server.addr, "A").await;
    wait_online(&server.room, 1).await;
    for body in ["one", "two", "three"] {
        a.send(body).await;
    }
    a.send("").await;
    a.send("/name Ann").await;
    assert_eq!(a.recv().await, "Your name has been changed to Ann\n");

    let mut late = Client::join(server.addr, "Late").await;
    assert_chat(&late.recv().await, "A", "one");
    assert_chat(&late.recv().await, "A", "two");
    assert_chat(&late.recv().await, "A", "three");
    assert_eq!(a.recv().await, "Late has joined the chat\n");

    // Renames and empty lines never enter history.
    assert_eq!(server.room.history().len().await, 3);

    a.send("four").await;
    assert_chat(&late.recv().await, "Ann", "four");
}

#[tokio::test]
async fn rename_is_broadcast_once() {
    let server = start_server().await;

    let mut alice = Client::join(server.addr, "Alice").await;
    wait_online(&server.room, 1).await;
    let mut carol = Client::join(server.addr, "Carol").await;
    assert_eq!(alice.recv().await, "Carol has joined the chat\n");

    alice.send("/name Bob").await;
    assert_eq!(alice.recv().await, "Your name has been changed to Bob\n");
    assert_eq!(carol.recv().await, "Alice has changed their name to Bob\n");

    alice.send("/name ").await;
    assert_eq!(
        alice.recv().await,
        "Name change failed. New name cannot be empty.\n"
    );

    // Carol's next line is the chat, not a second rename notice.
    alice.send("it's Bob now").await;
    assert_chat(&carol.recv().await, "Bob", "it's Bob now");

    drop(alice);
    assert_eq!(carol.recv().await, "Bob has left the chat\n");
}

#[tokio::test]
async fn many_clients_all_see_each_message() {
    let server = start_server().await;

    let mut clients = Vec::new();
    for n in 0..5 {
        let name = format!("user{n}");
        let mut client = Client::join(server.addr, &name).await;
        for earlier in 0..n {
            assert_chat(
                &client.recv().await,
                &format!("user{earlier}"),
                &format!("hello from user{earlier}"),
            );
        }
        client.send(&format!("hello from {name}")).await;
        wait_history(&server.room, n + 1).await;
        clients.push(client);
    }

    // After its replay, each client sees every later client join and speak.
    for (n, client) in clients.iter_mut().enumerate() {
        for later in n + 1..5 {
            assert_eq!(
                client.recv().await,
                format!("user{later} has joined the chat\n")
            );
            assert_chat(
                &client.recv().await,
                &format!("user{later}"),
                &format!("hello from user{later}"),
            );
        }
    }
    assert_eq!(server.room.online().await, 5);
}

#[tokio::test]
async fn too_slow_to_name_never_joins() {
    let server = start_server().await;

    let mut a = Client::join(server.addr, "A").await;
    wait_online(&server.room, 1).await;

    let ghost = TcpStream::connect(server.addr).await.unwrap();
    drop(ghost);

    let _b = Client::join(server.addr, "B").await;
    assert_eq!(a.recv().await, "B has joined the chat\n");
    wait_online(&server.room, 2).await;
}
