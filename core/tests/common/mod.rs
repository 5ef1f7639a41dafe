//! Scriptable in-memory host used by the dispatch tests.
//!
//! # Design
//! `MockHost` keeps a table of every handle it hands out and records every
//! release, so tests can check that each allocation comes back exactly once.
//! Settlement happens inline (inside `then`) by default, or on a fresh
//! thread to stand in for a host event loop.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use tafuta::{
    Continuation, FetchPrimitive, Handle, HostValue, NativeBody, NativeHeaders, NativeRequest,
    NativeResponse, Settlement, Thenable,
};

/// The resolved response a `MockHost` answers with.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub ok: bool,
    pub redirected: bool,
    pub status: u16,
    pub status_text: String,
    pub response_type: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// The body's `text` panics on the calling thread.
    pub panic_on_read: bool,
}

impl Fixture {
    pub fn ok(url: &str) -> Self {
        Self {
            ok: true,
            redirected: false,
            status: 200,
            status_text: "OK".to_string(),
            response_type: "basic".to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            body: String::new(),
            panic_on_read: false,
        }
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_panicking_body(mut self) -> Self {
        self.panic_on_read = true;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// How the host settles a fetch.
#[derive(Debug, Clone)]
pub enum Outcome {
    Resolve(Fixture),
    Reject(String),
    /// Resolve with a text value where a response is expected.
    ResolveWrongKind,
    /// Panic inside `fetch` on the calling thread.
    PanicInFetch(String),
    /// Panic inside `then`, after the continuation is registered.
    PanicInThen(String),
    /// Drop the continuation without calling it.
    Abandon,
}

#[derive(Default)]
struct State {
    next: AtomicU64,
    callbacks: Mutex<HashMap<Handle, Continuation>>,
    buffers: Mutex<HashMap<Handle, Bytes>>,
    allocated: Mutex<Vec<Handle>>,
    released: Mutex<Vec<Handle>>,
    invocations: AtomicUsize,
    requests: Mutex<Vec<NativeRequest>>,
    bodies: Mutex<Vec<Bytes>>,
}

impl State {
    fn next_handle(&self) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.allocated.lock().unwrap().push(handle);
        handle
    }

    fn fire(&self, callback: Handle, settlement: Option<Settlement>) {
        let continuation = self.callbacks.lock().unwrap().remove(&callback);
        match (continuation, settlement) {
            (Some(continuation), Some(settlement)) => continuation(settlement),
            (Some(continuation), None) => drop(continuation),
            (None, _) => panic!("then called with unregistered callback {callback}"),
        }
    }
}

pub struct MockHost {
    state: Arc<State>,
    outcome: Outcome,
    threaded: bool,
}

impl MockHost {
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(State::default()),
            outcome,
            threaded: false,
        })
    }

    /// Settle every promise from a separate thread.
    pub fn threaded(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(State::default()),
            outcome,
            threaded: true,
        })
    }

    pub fn invocations(&self) -> usize {
        self.state.invocations.load(Ordering::SeqCst)
    }

    pub fn allocated(&self) -> Vec<Handle> {
        self.state.allocated.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<Handle> {
        self.state.released.lock().unwrap().clone()
    }

    /// Every allocated handle released exactly once, nothing else released.
    pub fn assert_all_released(&self) {
        let mut allocated = self.allocated();
        let mut released = self.released();
        allocated.sort();
        released.sort();
        assert_eq!(allocated, released, "allocated and released handles differ");
    }

    pub fn last_request(&self) -> NativeRequest {
        self.state
            .requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request reached the host")
    }

    /// Payload bytes the host saw for the most recent body buffer.
    pub fn last_body(&self) -> Option<Bytes> {
        self.state.bodies.lock().unwrap().last().cloned()
    }

    fn settlement(&self) -> Option<Settlement> {
        match &self.outcome {
            Outcome::Resolve(fixture) => Some(Ok(HostValue::Response(native_response(
                &self.state,
                fixture,
                self.threaded,
            )))),
            Outcome::Reject(message) => Some(Err(message.clone())),
            Outcome::ResolveWrongKind => Some(Ok(HostValue::Text("surprise".to_string()))),
            Outcome::PanicInFetch(_) | Outcome::PanicInThen(_) => None,
            Outcome::Abandon => None,
        }
    }
}

impl FetchPrimitive for MockHost {
    fn alloc_buffer(&self, bytes: Bytes) -> Handle {
        let handle = self.state.next_handle();
        self.state.buffers.lock().unwrap().insert(handle, bytes);
        handle
    }

    fn register_callback(&self, continuation: Continuation) -> Handle {
        let handle = self.state.next_handle();
        self.state.callbacks.lock().unwrap().insert(handle, continuation);
        handle
    }

    fn release(&self, handle: Handle) {
        let mut released = self.state.released.lock().unwrap();
        assert!(!released.contains(&handle), "handle {handle} released twice");
        released.push(handle);
        self.state.buffers.lock().unwrap().remove(&handle);
        self.state.callbacks.lock().unwrap().remove(&handle);
    }

    fn fetch(&self, request: NativeRequest) -> Box<dyn Thenable> {
        self.state.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(tafuta::OptionValue::Buffer(handle)) =
            request.options.as_ref().and_then(|o| o.get("body"))
        {
            let bytes = self.state.buffers.lock().unwrap().get(handle).cloned();
            self.state.bodies.lock().unwrap().extend(bytes);
        }
        self.state.requests.lock().unwrap().push(request);
        if let Outcome::PanicInFetch(message) = &self.outcome {
            panic!("{message}");
        }
        let panic = match &self.outcome {
            Outcome::PanicInThen(message) => Some(message.clone()),
            _ => None,
        };
        Box::new(Pending {
            state: Arc::clone(&self.state),
            settlement: self.settlement(),
            threaded: self.threaded,
            panic,
        })
    }
}

struct Pending {
    state: Arc<State>,
    settlement: Option<Settlement>,
    threaded: bool,
    panic: Option<String>,
}

impl Thenable for Pending {
    fn then(self: Box<Self>, callback: Handle) {
        let Pending {
            state,
            settlement,
            threaded,
            panic,
        } = *self;
        if let Some(message) = panic {
            panic!("{message}");
        }
        if threaded {
            std::thread::spawn(move || state.fire(callback, settlement));
        } else {
            state.fire(callback, settlement);
        }
    }
}

/// Single-read body: the second read rejects.
struct MockBody {
    state: Arc<State>,
    text: Option<String>,
    threaded: bool,
    panic_on_read: bool,
}

impl NativeBody for MockBody {
    fn text(&mut self) -> Box<dyn Thenable> {
        if self.panic_on_read {
            panic!("body decoder crashed");
        }
        let settlement = match self.text.take() {
            Some(text) => Ok(HostValue::Text(text)),
            None => Err("body stream already read".to_string()),
        };
        Box::new(Pending {
            state: Arc::clone(&self.state),
            settlement: Some(settlement),
            threaded: self.threaded,
            panic: None,
        })
    }
}

fn native_response(state: &Arc<State>, fixture: &Fixture, threaded: bool) -> NativeResponse {
    let mut map = HeaderMap::new();
    for (name, value) in &fixture.headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    NativeResponse {
        ok: fixture.ok,
        redirected: fixture.redirected,
        status: fixture.status,
        status_text: fixture.status_text.clone(),
        response_type: fixture.response_type.clone(),
        url: fixture.url.clone(),
        headers: NativeHeaders::from(map),
        body: Box::new(MockBody {
            state: Arc::clone(state),
            text: Some(fixture.body.clone()),
            threaded,
            panic_on_read: fixture.panic_on_read,
        }),
    }
}

/// Reader that records how often it was polled and whether EOF was reached.
pub struct CountingReader {
    data: io::Cursor<Vec<u8>>,
    pub reads: Arc<AtomicUsize>,
    pub eof: Arc<AtomicBool>,
}

impl CountingReader {
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: io::Cursor::new(data.to_vec()),
            reads: Arc::new(AtomicUsize::new(0)),
            eof: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let n = self.data.read(buf)?;
        if n == 0 {
            assert!(!self.eof.swap(true, Ordering::SeqCst), "read past EOF twice");
        }
        Ok(n)
    }
}

/// Reader that fails on first use.
pub struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "upload source vanished"))
    }
}
