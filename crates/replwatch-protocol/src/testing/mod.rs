//! In-process RESP server for tests
//!
//! Understands the handful of commands replwatch sends (INFO, GET, SET, DEL)
//! plus the CLIENT calls a client library makes while connecting. Several
//! servers can share one keyspace to stand in for a primary and an
//! instantly-synchronised replica.

mod wire;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use wire::{Reply, ServerCodec};

/// Keyspace shared between fake servers
pub type Keyspace = Arc<Mutex<HashMap<String, Bytes>>>;

#[derive(Debug, Default)]
struct Behaviour {
    info: String,
    silent: bool,
    read_only: bool,
    commands: Vec<String>,
}

/// A listening fake server; stops when dropped
pub struct FakeServer {
    addr: SocketAddr,
    keyspace: Keyspace,
    behaviour: Arc<Mutex<Behaviour>>,
    accept_loop: JoinHandle<()>,
}

impl FakeServer {
    /// Start a server with its own empty keyspace
    pub async fn start() -> std::io::Result<Self> {
        Self::with_keyspace(Keyspace::default()).await
    }

    /// Start a server backed by an existing keyspace
    pub async fn with_keyspace(keyspace: Keyspace) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let behaviour = Arc::new(Mutex::new(Behaviour {
            info: "# Replication\r\nrole:master\r\nconnected_slaves:0\r\n".to_string(),
            ..Default::default()
        }));

        let accept_loop = {
            let keyspace = keyspace.clone();
            let behaviour = behaviour.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream, keyspace.clone(), behaviour.clone()));
                }
            })
        };

        Ok(Self {
            addr,
            keyspace,
            behaviour,
            accept_loop,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn keyspace(&self) -> Keyspace {
        self.keyspace.clone()
    }

    /// Make INFO report this server as a replica of `primary`
    pub fn replicate_from(&self, primary: SocketAddr) {
        self.set_info(&format!(
            "# Replication\r\nrole:slave\r\nmaster_host:{}\r\nmaster_port:{}\r\nmaster_link_status:up\r\n",
            primary.ip(),
            primary.port()
        ));
    }

    /// Replace the INFO payload
    pub fn set_info(&self, info: &str) {
        self.behaviour.lock().info = info.to_string();
    }

    /// Swallow commands without replying
    pub fn set_silent(&self, silent: bool) {
        self.behaviour.lock().silent = silent;
    }

    /// Reject writes with a READONLY error
    pub fn set_read_only(&self, read_only: bool) {
        self.behaviour.lock().read_only = read_only;
    }

    /// Data commands received so far, in order; connection setup is left out
    pub fn commands(&self) -> Vec<String> {
        self.behaviour.lock().commands.clone()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve(stream: TcpStream, keyspace: Keyspace, behaviour: Arc<Mutex<Behaviour>>) {
    let mut framed = Framed::new(stream, ServerCodec);
    while let Some(Ok(args)) = framed.next().await {
        let reply = {
            let mut behaviour = behaviour.lock();
            let name = args
                .first()
                .map(|name| String::from_utf8_lossy(name).to_ascii_uppercase())
                .unwrap_or_default();
            if behaviour.silent {
                continue;
            }
            if name != "CLIENT" {
                behaviour.commands.push(name.clone());
            }
            execute(&name, &args, &keyspace, &behaviour)
        };
        if framed.send(reply).await.is_err() {
            break;
        }
    }
}

fn execute(name: &str, args: &[Bytes], keyspace: &Keyspace, behaviour: &Behaviour) -> Reply {
    let key = || args.get(1).map(|k| String::from_utf8_lossy(k).into_owned());

    match (name, args.len()) {
        ("CLIENT", _) => Reply::Status("OK".to_string()),
        ("PING", 1) => Reply::Status("PONG".to_string()),
        ("INFO", 1 | 2) => Reply::Bulk(Bytes::from(behaviour.info.clone())),
        ("GET", 2) => match key().and_then(|k| keyspace.lock().get(&k).cloned()) {
            Some(value) => Reply::Bulk(value),
            None => Reply::Nil,
        },
        ("SET" | "DEL", _) if behaviour.read_only => {
            Reply::Error("READONLY You can't write against a read only replica.".to_string())
        }
        ("SET", 3) => {
            if let Some(k) = key() {
                keyspace.lock().insert(k, args[2].clone());
            }
            Reply::Status("OK".to_string())
        }
        ("DEL", 2) => {
            let removed = key().and_then(|k| keyspace.lock().remove(&k));
            Reply::Integer(i64::from(removed.is_some()))
        }
        _ => Reply::Error(format!(
            "ERR unknown command or wrong number of arguments for '{name}'"
        )),
    }
}
