//! Scripted engine shared by the integration tests.
//!
//! The engine records every call and hands each session's `SignalSender`
//! back to the test, which then plays the part of the platform player.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{PlaybackEngine, PlaybackRequest, SessionToken, SignalSender};
use core_async::sync::{mpsc, unbounded};
use core_playback::{spawn_player, EventEmitter, PlayerHandle};
use core_runtime::events::{EventBus, EventEnvelope, EventStream};
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Acquire(SessionToken, String),
    Play(SessionToken),
    Stop(SessionToken),
    Release(SessionToken),
}

pub struct ScriptedEngine {
    calls: Mutex<Vec<EngineCall>>,
    requests: Mutex<Vec<PlaybackRequest>>,
    acquired: mpsc::UnboundedSender<SignalSender>,
    fail_acquire: AtomicBool,
    fail_play: AtomicBool,
}

impl ScriptedEngine {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SignalSender>) {
        let (acquired, rx) = unbounded();
        let engine = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            acquired,
            fail_acquire: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
        });
        (engine, rx)
    }

    pub fn fail_next_acquire(&self) {
        self.fail_acquire.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_play(&self) {
        self.fail_play.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<PlaybackRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn releases_of(&self, token: SessionToken) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == EngineCall::Release(token))
            .count()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybackEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn acquire(&self, request: PlaybackRequest, signals: SignalSender) -> Result<()> {
        self.record(EngineCall::Acquire(
            signals.token(),
            request.source().to_string(),
        ));
        self.requests.lock().unwrap().push(request);
        if self.fail_acquire.swap(false, Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("cannot open source".into()));
        }
        let _ = self.acquired.unbounded_send(signals);
        Ok(())
    }

    async fn play(&self, token: SessionToken) -> Result<()> {
        self.record(EngineCall::Play(token));
        if self.fail_play.swap(false, Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("output device lost".into()));
        }
        Ok(())
    }

    async fn stop(&self, token: SessionToken) -> Result<()> {
        self.record(EngineCall::Stop(token));
        Ok(())
    }

    async fn release(&self, token: SessionToken) -> Result<()> {
        self.record(EngineCall::Release(token));
        Ok(())
    }
}

pub struct Harness {
    pub engine: Arc<ScriptedEngine>,
    pub acquired: mpsc::UnboundedReceiver<SignalSender>,
    pub player: PlayerHandle,
    pub events: EventStream,
}

impl Harness {
    pub fn new() -> Self {
        let (engine, acquired) = ScriptedEngine::new();
        let emitter = EventEmitter::new(EventBus::new(16));
        let events = emitter.subscribe();
        let player = spawn_player(engine.clone(), emitter);
        Self {
            engine,
            acquired,
            player,
            events,
        }
    }

    /// Signal sender of the next acquired session.
    pub async fn next_acquired(&mut self) -> SignalSender {
        tokio::time::timeout(Duration::from_secs(1), self.acquired.next())
            .await
            .expect("engine was never asked to acquire")
            .expect("engine dropped")
    }

    /// Waits until every signal sent so far has been applied.
    pub async fn settle(&self) {
        self.player.snapshot().await.unwrap();
    }

    pub async fn next_event(&mut self) -> EventEnvelope {
        tokio::time::timeout(Duration::from_secs(1), self.events.recv())
            .await
            .expect("no event delivered")
            .expect("event bus closed")
    }

    /// Nothing queued for the host. A closed bus counts as nothing.
    pub fn assert_no_event(&mut self) {
        if let Some(Ok(envelope)) = self.events.try_recv() {
            panic!("unexpected event delivered: {:?}", envelope);
        }
    }
}
