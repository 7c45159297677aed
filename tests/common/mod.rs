//! Scripted in-process mixer server for integration tests.
#![allow(dead_code)]

use futures_util::StreamExt;
use jamyx::{Command, JsonCodec, Target, Verb};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;

/// How the fake server answers one command
pub enum Script {
    /// Write the value in one go
    Reply(Value),
    /// Write the value in chunks of the given size
    Chunked(Value, usize),
    /// Wait, then write the value
    Delayed(Duration, Value),
    /// Write raw bytes
    Raw(Vec<u8>),
    /// Close without replying
    Close,
    /// Never reply; wait for the client to hang up
    Hold,
}

pub struct FakeMixer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Command>>>,
    hung_up: Arc<AtomicUsize>,
}

impl FakeMixer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Command) -> Script + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let hung_up = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(handler);

        let accept_received = received.clone();
        let accept_hung_up = hung_up.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(
                    stream,
                    handler.clone(),
                    accept_received.clone(),
                    accept_hung_up.clone(),
                ));
            }
        });

        Self {
            addr,
            received,
            hung_up,
        }
    }

    /// Serve a stateful mixer model
    pub async fn with_model(model: Arc<MixerModel>) -> Self {
        Self::start(move |cmd| model.handle(cmd)).await
    }

    pub fn target(&self) -> Target {
        Target::new(self.addr.ip().to_string(), self.addr.port())
    }

    /// Commands received so far, in arrival order
    pub fn received(&self) -> Vec<Command> {
        self.received.lock().unwrap().clone()
    }

    /// Number of held connections the client has closed
    pub fn hung_up(&self) -> usize {
        self.hung_up.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` commands have arrived
    pub async fn wait_for_commands(&self, count: usize) {
        for _ in 0..200 {
            if self.received.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} commands", count);
    }

    pub async fn wait_for_hang_ups(&self, count: usize) {
        for _ in 0..200 {
            if self.hung_up() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} hang ups", count);
    }
}

async fn serve<F>(
    stream: TcpStream,
    handler: Arc<F>,
    received: Arc<Mutex<Vec<Command>>>,
    hung_up: Arc<AtomicUsize>,
) where
    F: Fn(&Command) -> Script + Send + Sync + 'static,
{
    let (read, mut write) = stream.into_split();
    let mut requests = FramedRead::new(read, JsonCodec::default());

    let command: Command = match requests.next().await {
        Some(Ok(value)) => serde_json::from_value(value).unwrap(),
        _ => return,
    };
    received.lock().unwrap().push(command.clone());

    match (*handler)(&command) {
        Script::Reply(value) => {
            let _ = write.write_all(&serde_json::to_vec(&value).unwrap()).await;
        }
        Script::Chunked(value, size) => {
            let bytes = serde_json::to_vec(&value).unwrap();
            for chunk in bytes.chunks(size) {
                if write.write_all(chunk).await.is_err() {
                    return;
                }
                let _ = write.flush().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
        Script::Delayed(delay, value) => {
            tokio::time::sleep(delay).await;
            let _ = write.write_all(&serde_json::to_vec(&value).unwrap()).await;
        }
        Script::Raw(bytes) => {
            let _ = write.write_all(&bytes).await;
        }
        Script::Close => {}
        Script::Hold => {
            let mut read = requests.into_inner();
            let mut buf = [0u8; 64];
            loop {
                match read.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            hung_up.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Port JSON in the server's reply shape
pub fn port_json(name: &str, ptype: &str, ismono: bool, vol: f64, bal: f64, cons: Value) -> Value {
    json!({
        "port": name,
        "ptype": ptype,
        "ismono": ismono,
        "vol": vol,
        "bal": bal,
        "cons": cons
    })
}

#[derive(Debug, Clone)]
pub struct FakePort {
    pub name: String,
    pub input: bool,
    pub mono: bool,
    pub vol: f64,
    pub bal: f64,
    pub cons: Vec<String>,
}

impl FakePort {
    pub fn input(name: &str) -> Self {
        Self {
            name: name.to_string(),
            input: true,
            mono: true,
            vol: 1.0,
            bal: 0.0,
            cons: Vec::new(),
        }
    }

    pub fn output(name: &str) -> Self {
        Self {
            name: name.to_string(),
            input: false,
            mono: false,
            vol: 1.0,
            bal: 0.0,
            cons: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        port_json(
            &self.name,
            if self.input { "in" } else { "out" },
            self.mono,
            self.vol,
            self.bal,
            json!(self.cons),
        )
    }
}

/// Minimal in-memory mixer implementing the command set
pub struct MixerModel {
    ports: Mutex<Vec<FakePort>>,
    monitor: Mutex<Option<(bool, String)>>,
    listen_delay: Duration,
}

impl MixerModel {
    pub fn new(ports: Vec<FakePort>) -> Arc<Self> {
        Arc::new(Self {
            ports: Mutex::new(ports),
            monitor: Mutex::new(None),
            listen_delay: Duration::from_millis(20),
        })
    }

    pub fn port(&self, input: bool, name: &str) -> Option<FakePort> {
        self.ports
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.input == input && p.name == name)
            .cloned()
    }

    fn ok() -> Script {
        Script::Reply(json!({"status": "ok"}))
    }

    fn error(detail: &str) -> Script {
        Script::Reply(json!({"error": detail}))
    }

    fn get(&self, input: bool, name: &str) -> Script {
        match self.port(input, name) {
            Some(port) => Script::Reply(json!({"obj": port.to_json()})),
            None => Self::error("no such port"),
        }
    }

    fn with_port(&self, input: bool, name: &str, f: impl FnOnce(&mut FakePort)) -> bool {
        let mut ports = self.ports.lock().unwrap();
        match ports.iter_mut().find(|p| p.input == input && p.name == name) {
            Some(port) => {
                f(port);
                true
            }
            None => false,
        }
    }

    fn route(&self, input: &str, output: &str, connect: Option<bool>) -> Script {
        let connected = self
            .port(true, input)
            .map(|p| p.cons.iter().any(|c| c == output));
        let Some(connected) = connected else {
            return Self::error("no such input");
        };
        let want = connect.unwrap_or(!connected);

        let set = |cons: &mut Vec<String>, other: &str| {
            cons.retain(|c| c != other);
            if want {
                cons.push(other.to_string());
            }
        };
        let input_ok = self.with_port(true, input, |p| set(&mut p.cons, output));
        let output_ok = self.with_port(false, output, |p| set(&mut p.cons, input));
        if input_ok && output_ok {
            Self::ok()
        } else {
            Self::error("no such output")
        }
    }

    pub fn handle(&self, cmd: &Command) -> Script {
        let opts: Vec<&str> = cmd.opts.iter().map(String::as_str).collect();
        match (cmd.cmd, opts.as_slice()) {
            (Verb::Get, ["channels"]) => {
                let ports = self.ports.lock().unwrap();
                let group = |input: bool| -> Vec<Value> {
                    ports
                        .iter()
                        .filter(|p| p.input == input)
                        .map(FakePort::to_json)
                        .collect()
                };
                Script::Reply(json!({"obj": {"inputs": group(true), "outputs": group(false)}}))
            }
            (Verb::Get, ["monitor"]) => match self.monitor.lock().unwrap().clone() {
                Some((input, name)) => self.get(input, &name),
                None => Self::error("nothing monitored"),
            },
            (Verb::Get, [dir, name]) => self.get(*dir == "i", name),
            (Verb::Set, ["v", dir, name, value]) => {
                let value: f64 = value.parse().unwrap();
                if self.with_port(*dir == "i", name, |p| p.vol = value) {
                    Self::ok()
                } else {
                    Self::error("no such port")
                }
            }
            (Verb::Set, ["b", dir, name, value]) => {
                let value: f64 = value.parse().unwrap();
                if self.with_port(*dir == "i", name, |p| p.bal = value) {
                    Self::ok()
                } else {
                    Self::error("no such port")
                }
            }
            (Verb::Set, ["monitor", dir, name]) => {
                *self.monitor.lock().unwrap() = Some((*dir == "i", name.to_string()));
                Self::ok()
            }
            (Verb::Connect, [input, output]) => self.route(input, output, Some(true)),
            (Verb::Disconnect, [input, output]) => self.route(input, output, Some(false)),
            (Verb::Toggle, [input, output]) => self.route(input, output, None),
            (Verb::Monitor, ["vol", dir, name]) => match self.port(*dir == "i", name) {
                Some(port) => Script::Delayed(self.listen_delay, json!({"obj": port.to_json()})),
                None => Self::error("no such port"),
            },
            _ => Self::error("unknown command"),
        }
    }
}
