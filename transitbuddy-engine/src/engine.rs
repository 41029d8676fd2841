use crate::session::{ConversationState, Message, Transcript};
use crate::traits::{GeolocationGateway, TransitApi};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use transitbuddy_core::classify::{
    BotReply, ReplyError, classify_arrivals, classify_nearby, classify_reply,
};
use transitbuddy_core::geo::{GeolocationFailure, GeolocationOptions};
use transitbuddy_core::render::{
    MALFORMED_REPLY_MESSAGE, QuickAction, View, render_reply, render_stop_list,
};
use transitbuddy_core::text::pluralize;
use transitbuddy_core::types::{ChatSession, Sender};

pub const NETWORK_FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";
pub const ARRIVALS_FAILURE_MESSAGE: &str = "Error fetching arrivals. Please try again.";
pub const NEARBY_FAILURE_MESSAGE: &str = "Unable to load nearby stops. Please try again.";
pub const NO_NEARBY_STOPS_MESSAGE: &str = "No bus stops found nearby.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("malformed reply")]
    Malformed,
    #[error("geolocation failed: {0}")]
    Geolocation(GeolocationFailure),
}

impl ConversationError {
    fn from_reply(e: &ReplyError) -> Self {
        match e {
            ReplyError::Server(msg) => Self::Server(msg.clone()),
            ReplyError::Malformed => Self::Malformed,
        }
    }

    /// Text appended to the transcript for this failure.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => NETWORK_FAILURE_MESSAGE,
            Self::Server(msg) => msg,
            Self::Malformed => MALFORMED_REPLY_MESSAGE,
            Self::Geolocation(f) => f.user_message(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    /// Typed into the input field; the draft is cleared once accepted.
    Typed,
    /// Suggested prompt or card tap; the draft is left alone.
    QuickAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExchangeReport {
    /// Bot messages added to the transcript by this exchange.
    pub appended: usize,
    pub failure: Option<ConversationError>,
}

impl ExchangeReport {
    fn merge(mut self, other: ExchangeReport) -> Self {
        self.appended += other.appended;
        self.failure = self.failure.or(other.failure);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input.
    Ignored,
    /// Another request is still outstanding; nothing was sent.
    Busy,
    Completed(ExchangeReport),
}

#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub geolocation: GeolocationOptions,
    pub route_home_prompt: String,
    pub suggested_prompts: Vec<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            geolocation: GeolocationOptions::default(),
            route_home_prompt: "how to get from home to orchard".into(),
            suggested_prompts: Vec::new(),
        }
    }
}

struct SendSlot<'a>(&'a AtomicBool);

impl Drop for SendSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the typing indicator on while any request (send or location) is in flight.
struct TypingGuard<'a> {
    busy: &'a AtomicUsize,
    typing: &'a watch::Sender<bool>,
}

impl<'a> TypingGuard<'a> {
    fn new(busy: &'a AtomicUsize, typing: &'a watch::Sender<bool>) -> Self {
        busy.fetch_add(1, Ordering::AcqRel);
        typing.send_modify(|t| *t = busy.load(Ordering::Acquire) > 0);
        Self { busy, typing }
    }
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.busy.fetch_sub(1, Ordering::AcqRel);
        let busy = self.busy;
        self.typing
            .send_modify(|t| *t = busy.load(Ordering::Acquire) > 0);
    }
}

struct Admitted<'a> {
    text: String,
    origin: InputOrigin,
    slot: SendSlot<'a>,
    typing: TypingGuard<'a>,
}

/// Owns one conversation: the transcript, the outstanding-request flag and the
/// typing indicator. Drives send → classify → render → append.
pub struct ConversationOrchestrator {
    cfg: ConversationConfig,
    session: ChatSession,
    api: Arc<dyn TransitApi>,
    geo: Arc<dyn GeolocationGateway>,
    transcript: Mutex<Transcript>,
    draft: Mutex<String>,
    sending: AtomicBool,
    busy: AtomicUsize,
    typing: watch::Sender<bool>,
    revision: watch::Sender<usize>,
}

impl ConversationOrchestrator {
    pub fn new(
        cfg: ConversationConfig,
        session: ChatSession,
        api: Arc<dyn TransitApi>,
        geo: Arc<dyn GeolocationGateway>,
    ) -> Self {
        let (typing, _) = watch::channel(false);
        let (revision, _) = watch::channel(0);
        Self {
            cfg,
            session,
            api,
            geo,
            transcript: Mutex::new(Transcript::new()),
            draft: Mutex::new(String::new()),
            sending: AtomicBool::new(false),
            busy: AtomicUsize::new(0),
            typing,
            revision,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.cfg
    }

    pub fn state(&self) -> ConversationState {
        if self.sending.load(Ordering::Acquire) {
            ConversationState::Sending
        } else {
            ConversationState::Idle
        }
    }

    pub fn is_typing(&self) -> bool {
        *self.typing.borrow()
    }

    pub fn subscribe_typing(&self) -> watch::Receiver<bool> {
        self.typing.subscribe()
    }

    /// Yields the transcript length after every append.
    pub fn subscribe_transcript(&self) -> watch::Receiver<usize> {
        self.revision.subscribe()
    }

    pub fn transcript(&self) -> Transcript {
        self.lock_transcript().clone()
    }

    pub fn messages_since(&self, seq: u64) -> Vec<Message> {
        self.lock_transcript().since(seq).to_vec()
    }

    pub fn draft(&self) -> String {
        self.lock_draft().clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.lock_draft() = text.into();
    }

    /// Appends the user message immediately, then resolves once the reply has
    /// been rendered into the transcript.
    pub fn submit<'a>(
        &'a self,
        text: &str,
    ) -> impl Future<Output = SubmitOutcome> + Send + use<'a> {
        let admitted = self.admit(text, InputOrigin::Typed);
        async move {
            match admitted {
                Ok(ticket) => self.exchange(ticket).await,
                Err(outcome) => outcome,
            }
        }
    }

    /// Same as [`submit`](Self::submit) but leaves the draft untouched.
    pub fn submit_quick_action<'a>(
        &'a self,
        text: &str,
    ) -> impl Future<Output = SubmitOutcome> + Send + use<'a> {
        let admitted = self.admit(text, InputOrigin::QuickAction);
        async move {
            match admitted {
                Ok(ticket) => self.exchange(ticket).await,
                Err(outcome) => outcome,
            }
        }
    }

    pub fn perform<'a>(
        &'a self,
        action: &QuickAction,
    ) -> impl Future<Output = SubmitOutcome> + Send + use<'a> {
        self.submit_quick_action(&action.message)
    }

    /// Stop card tap: asks for arrivals at `stop_code` on the user's behalf.
    pub fn select_stop<'a>(
        &'a self,
        stop_code: &str,
    ) -> impl Future<Output = SubmitOutcome> + Send + use<'a> {
        self.perform(&QuickAction::select_stop(stop_code.trim()))
    }

    pub fn route_home(&self) -> impl Future<Output = SubmitOutcome> + Send + use<'_> {
        self.submit_quick_action(&self.cfg.route_home_prompt)
    }

    /// Looks up live arrivals directly, without going through the assistant.
    pub async fn request_arrivals(&self, stop_code: &str) -> SubmitOutcome {
        let code = stop_code.trim();
        if code.is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(slot) = self.try_acquire_send() else {
            log::warn!("arrivals lookup rejected: a request is already outstanding");
            return SubmitOutcome::Busy;
        };

        let typing = self.typing_guard();
        let result = self.api.fetch_arrivals(self.session.id(), code).await;
        drop(typing);

        let report = match result {
            Ok(payload) => self.append_replies(&[classify_arrivals(&payload)]),
            Err(e) => {
                log::error!("fetch arrivals for {code} failed: {e:#}");
                self.fail(
                    ConversationError::Network(format!("{e:#}")),
                    ARRIVALS_FAILURE_MESSAGE,
                )
            }
        };
        drop(slot);
        SubmitOutcome::Completed(report)
    }

    /// Resolves the device position and lists the stops around it.
    ///
    /// Runs independently of the outstanding-message flag; its messages are
    /// appended whenever it completes.
    pub async fn request_nearby_stops(&self) -> ExchangeReport {
        let typing = self.typing_guard();
        let position = match self.geo.resolve_position(&self.cfg.geolocation).await {
            Ok(p) => p,
            Err(f) => {
                drop(typing);
                log::warn!("geolocation failed: {f}");
                return self.fail(ConversationError::Geolocation(f), f.user_message());
            }
        };

        let result = self
            .api
            .fetch_nearby_stops(self.session.id(), position)
            .await;
        drop(typing);

        let payload = match result {
            Ok(p) => p,
            Err(e) => {
                log::error!("fetch nearby stops failed: {e:#}");
                return self.fail(
                    ConversationError::Network(format!("{e:#}")),
                    NEARBY_FAILURE_MESSAGE,
                );
            }
        };

        match classify_nearby(&payload) {
            BotReply::StopList(stops) if stops.is_empty() => {
                self.append(Sender::Bot, View::text(NO_NEARBY_STOPS_MESSAGE));
                ExchangeReport {
                    appended: 1,
                    failure: None,
                }
            }
            BotReply::StopList(stops) => {
                log::info!("found {} nearby stops", stops.len());
                let summary = format!("Found {}", pluralize(stops.len(), "nearby stop"));
                self.append(Sender::Bot, View::text(&summary));
                self.append(Sender::Bot, render_stop_list(&stops));
                ExchangeReport {
                    appended: 2,
                    failure: None,
                }
            }
            other => self.append_replies(&[other]),
        }
    }

    fn admit(&self, text: &str, origin: InputOrigin) -> Result<Admitted<'_>, SubmitOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitOutcome::Ignored);
        }
        let Some(slot) = self.try_acquire_send() else {
            log::warn!("message rejected: a reply is still outstanding");
            return Err(SubmitOutcome::Busy);
        };

        if origin == InputOrigin::Typed {
            self.lock_draft().clear();
        }
        self.append(Sender::User, View::text(text));

        Ok(Admitted {
            text: text.to_string(),
            origin,
            slot,
            typing: self.typing_guard(),
        })
    }

    async fn exchange(&self, ticket: Admitted<'_>) -> SubmitOutcome {
        let Admitted {
            text,
            origin,
            slot,
            typing,
        } = ticket;
        log::info!("sending {origin:?} message ({} chars)", text.chars().count());

        let result = self.api.send_message(self.session.id(), &text).await;
        drop(typing);

        let payload = match result {
            Ok(p) => p,
            Err(e) => {
                log::error!("send message failed: {e:#}");
                return SubmitOutcome::Completed(self.fail(
                    ConversationError::Network(format!("{e:#}")),
                    NETWORK_FAILURE_MESSAGE,
                ));
            }
        };

        let classified = classify_reply(&payload);
        log::debug!(
            "reply kinds={:?} location_requested={}",
            classified.replies.iter().map(BotReply::kind).collect::<Vec<_>>(),
            classified.location_requested
        );

        let mut report = self.append_replies(&classified.replies);
        if classified.location_requested {
            report = report.merge(self.request_nearby_stops().await);
        }

        drop(slot);
        SubmitOutcome::Completed(report)
    }

    fn append_replies(&self, replies: &[BotReply]) -> ExchangeReport {
        let mut report = ExchangeReport::default();
        for reply in replies {
            if let BotReply::Error(e) = reply {
                log::warn!("reply error: {e:?}");
                if report.failure.is_none() {
                    report.failure = Some(ConversationError::from_reply(e));
                }
            }
            for view in render_reply(reply) {
                self.append(Sender::Bot, view);
                report.appended += 1;
            }
        }
        report
    }

    fn fail(&self, err: ConversationError, shown: &str) -> ExchangeReport {
        self.append(Sender::Bot, View::text(shown));
        ExchangeReport {
            appended: 1,
            failure: Some(err),
        }
    }

    fn append(&self, sender: Sender, view: View) {
        let len = {
            let mut t = self.lock_transcript();
            t.push(sender, view);
            t.len()
        };
        self.revision.send_replace(len);
    }

    fn try_acquire_send(&self) -> Option<SendSlot<'_>> {
        self.sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendSlot(&self.sending))
    }

    fn typing_guard(&self) -> TypingGuard<'_> {
        TypingGuard::new(&self.busy, &self.typing)
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_draft(&self) -> MutexGuard<'_, String> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use tokio::sync::Notify;
    use transitbuddy_core::geo::GeoPosition;
    use transitbuddy_core::render::{NO_BUSES_MESSAGE, TextView};
    use transitbuddy_core::types::SessionId;

    #[derive(Default)]
    struct FakeApi {
        replies: Mutex<VecDeque<Result<Value, String>>>,
        arrivals: Mutex<Option<Result<Value, String>>>,
        nearby: Mutex<Option<Result<Value, String>>>,
        sent: Mutex<Vec<String>>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl FakeApi {
        fn replying(replies: Vec<Result<Value, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }
    }

    fn scripted(slot: &Mutex<Option<Result<Value, String>>>) -> anyhow::Result<Value> {
        slot.lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err("unscripted".into()))
            .map_err(anyhow::Error::msg)
    }

    #[async_trait::async_trait]
    impl TransitApi for FakeApi {
        async fn send_message(&self, _session: &SessionId, message: &str) -> anyhow::Result<Value> {
            self.sent.lock().unwrap().push(message.to_string());
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no reply scripted".into()))
                .map_err(anyhow::Error::msg)
        }

        async fn fetch_arrivals(&self, _session: &SessionId, _code: &str) -> anyhow::Result<Value> {
            scripted(&self.arrivals)
        }

        async fn fetch_nearby_stops(
            &self,
            _session: &SessionId,
            _position: GeoPosition,
        ) -> anyhow::Result<Value> {
            scripted(&self.nearby)
        }
    }

    struct FixedGeo(Result<GeoPosition, GeolocationFailure>);

    #[async_trait::async_trait]
    impl GeolocationGateway for FixedGeo {
        async fn resolve_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<GeoPosition, GeolocationFailure> {
            self.0
        }
    }

    fn orchestrator(api: FakeApi, geo: Result<GeoPosition, GeolocationFailure>) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            ConversationConfig::default(),
            ChatSession::with_id(SessionId::new("session-test")),
            Arc::new(api),
            Arc::new(FixedGeo(geo)),
        )
    }

    fn texts(o: &ConversationOrchestrator) -> Vec<String> {
        o.transcript()
            .messages()
            .iter()
            .filter_map(|m| m.view.as_text().map(TextView::plain_text))
            .collect()
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let o = orchestrator(FakeApi::default(), Err(GeolocationFailure::Unsupported));
        assert_eq!(o.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(o.submit("  \n\t ").await, SubmitOutcome::Ignored);
        assert!(o.transcript().is_empty());
        assert_eq!(o.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn user_message_is_appended_before_the_reply_is_awaited() {
        let o = orchestrator(
            FakeApi::replying(vec![Ok(json!({"message": "Hello!"}))]),
            Err(GeolocationFailure::Unsupported),
        );
        o.set_draft("hi there");

        let pending = o.submit("  hi there ");
        let t = o.transcript();
        assert_eq!(t.len(), 1);
        assert!(t.messages()[0].is_user());
        assert_eq!(texts(&o), vec!["hi there"]);
        assert_eq!(o.state(), ConversationState::Sending);
        assert!(o.is_typing());
        assert_eq!(o.draft(), "");

        let outcome = pending.await;
        assert_eq!(
            outcome,
            SubmitOutcome::Completed(ExchangeReport {
                appended: 1,
                failure: None
            })
        );
        assert_eq!(texts(&o), vec!["hi there", "Hello!"]);
        assert_eq!(o.state(), ConversationState::Idle);
        assert!(!o.is_typing());
    }

    #[tokio::test]
    async fn second_submit_while_sending_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let api = FakeApi {
            replies: Mutex::new(vec![Ok(json!({"message": "first reply"}))].into()),
            gate: Some((entered.clone(), release.clone())),
            ..Default::default()
        };
        let o = Arc::new(orchestrator(api, Err(GeolocationFailure::Unsupported)));

        let first = {
            let o = o.clone();
            tokio::spawn(async move { o.submit("first").await })
        };
        entered.notified().await;

        assert_eq!(o.submit("second").await, SubmitOutcome::Busy);
        assert_eq!(o.request_arrivals("83139").await, SubmitOutcome::Busy);
        assert_eq!(texts(&o), vec!["first"]);

        release.notify_one();
        let outcome = first.await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        assert_eq!(texts(&o), vec!["first", "first reply"]);
        assert_eq!(o.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn nearby_lookup_overlaps_an_outstanding_send() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let api = FakeApi {
            replies: Mutex::new(vec![Ok(json!({"message": "late reply"}))].into()),
            nearby: Mutex::new(Some(Ok(json!({
                "type": "nearby_stops",
                "stops": [
                    {"code": "83139", "description": "Opp Blk 1", "distance": 50},
                    {"code": "83131", "description": "Blk 2", "distance": 120}
                ]
            })))),
            gate: Some((entered.clone(), release.clone())),
            ..Default::default()
        };
        let o = Arc::new(orchestrator(api, Ok(GeoPosition::new(1.29, 103.85))));

        let send = {
            let o = o.clone();
            tokio::spawn(async move { o.submit("when is the next 15?").await })
        };
        entered.notified().await;

        let report = o.request_nearby_stops().await;
        assert_eq!(report.appended, 2);
        assert!(report.failure.is_none());
        assert_eq!(o.state(), ConversationState::Sending);
        // The send is still in flight, so the indicator stays on.
        assert!(o.is_typing());
        let t = o.transcript();
        assert_eq!(t.len(), 3);
        assert!(matches!(t.messages()[2].view, View::StopList(_)));

        release.notify_one();
        assert!(matches!(send.await.unwrap(), SubmitOutcome::Completed(_)));
        assert!(!o.is_typing());
        assert_eq!(o.state(), ConversationState::Idle);

        let t = o.transcript();
        assert_eq!(t.len(), 4);
        assert_eq!(
            texts(&o),
            vec!["when is the next 15?", "Found 2 nearby stops", "late reply"]
        );
        assert!(matches!(t.messages()[2].view, View::StopList(_)));
        assert!(t.messages()[0].is_user());
    }

    #[tokio::test]
    async fn network_failure_appends_generic_apology() {
        let o = orchestrator(
            FakeApi::replying(vec![Err("connection refused".into())]),
            Err(GeolocationFailure::Unsupported),
        );
        let SubmitOutcome::Completed(report) = o.submit("hello").await else {
            panic!("expected completion");
        };
        assert!(matches!(report.failure, Some(ConversationError::Network(_))));
        assert_eq!(texts(&o), vec!["hello", NETWORK_FAILURE_MESSAGE]);
        assert!(!o.is_typing());

        // The session survives and keeps accepting input.
        assert!(matches!(o.submit("again").await, SubmitOutcome::Completed(_)));
        assert_eq!(o.transcript().len(), 4);
    }

    #[tokio::test]
    async fn server_error_is_shown_verbatim() {
        let o = orchestrator(
            FakeApi::replying(vec![Ok(json!({"error": "Lex client not configured", "routes": []}))]),
            Err(GeolocationFailure::Unsupported),
        );
        let SubmitOutcome::Completed(report) = o.submit("hello").await else {
            panic!("expected completion");
        };
        assert_eq!(
            report.failure,
            Some(ConversationError::Server("Lex client not configured".into()))
        );
        assert_eq!(texts(&o)[1], "Lex client not configured");
    }

    #[tokio::test]
    async fn unknown_reply_shape_gets_fallback_message() {
        let o = orchestrator(
            FakeApi::replying(vec![Ok(json!({"intentName": "Unknown"}))]),
            Err(GeolocationFailure::Unsupported),
        );
        o.submit("hello").await;
        assert_eq!(texts(&o)[1], MALFORMED_REPLY_MESSAGE);
    }

    #[tokio::test]
    async fn nearby_stops_appends_summary_then_list() {
        let api = FakeApi {
            nearby: Mutex::new(Some(Ok(json!({
                "type": "nearby_stops",
                "stops": [
                    {"code": "83139", "description": "Opp Blk 1", "distance": 50},
                    {"code": "83131", "description": "Blk 2", "distance": 120},
                    {"code": "83141", "description": "Blk 9", "distance": 310}
                ]
            })))),
            ..Default::default()
        };
        let o = orchestrator(api, Ok(GeoPosition::new(1.29, 103.85)));

        let report = o.request_nearby_stops().await;
        assert_eq!(report.appended, 2);
        let t = o.transcript();
        assert_eq!(
            t.messages()[0].view.as_text().map(TextView::plain_text).as_deref(),
            Some("Found 3 nearby stops")
        );
        let View::StopList(list) = &t.messages()[1].view else {
            panic!("expected stop list");
        };
        assert_eq!(list.cards.len(), 3);
    }

    #[tokio::test]
    async fn empty_nearby_result_is_a_single_message() {
        let api = FakeApi {
            nearby: Mutex::new(Some(Ok(json!({"type": "nearby_stops", "stops": []})))),
            ..Default::default()
        };
        let o = orchestrator(api, Ok(GeoPosition::new(1.29, 103.85)));
        o.request_nearby_stops().await;
        assert_eq!(texts(&o), vec![NO_NEARBY_STOPS_MESSAGE]);
    }

    #[tokio::test]
    async fn geolocation_timeout_has_its_own_message() {
        let o = orchestrator(FakeApi::default(), Err(GeolocationFailure::Timeout));
        let report = o.request_nearby_stops().await;
        assert_eq!(
            report.failure,
            Some(ConversationError::Geolocation(GeolocationFailure::Timeout))
        );
        assert_eq!(texts(&o), vec!["Location request timed out."]);
        assert!(!o.is_typing());
    }

    #[tokio::test]
    async fn location_request_reply_runs_the_nearby_flow() {
        let api = FakeApi {
            replies: Mutex::new(vec![Ok(json!({"type": "request_location"}))].into()),
            nearby: Mutex::new(Some(Ok(json!({
                "type": "nearby_stops",
                "stops": [{"code": "1", "description": "A"}]
            })))),
            ..Default::default()
        };
        let o = orchestrator(api, Ok(GeoPosition::new(1.29, 103.85)));
        o.submit("bus stops near me").await;
        assert_eq!(texts(&o), vec!["bus stops near me", "Found 1 nearby stop"]);
        assert_eq!(o.transcript().len(), 3);
    }

    #[tokio::test]
    async fn selecting_a_stop_sends_arrivals_query_and_keeps_draft() {
        let api = Arc::new(FakeApi::replying(vec![Ok(json!({"message": "ok"}))]));
        let o = ConversationOrchestrator::new(
            ConversationConfig::default(),
            ChatSession::start(),
            api.clone(),
            Arc::new(FixedGeo(Err(GeolocationFailure::Unsupported))),
        );
        o.set_draft("half typed");
        o.select_stop("83139").await;
        assert_eq!(api.sent.lock().unwrap().as_slice(), ["Bus arrivals at 83139"]);
        assert_eq!(texts(&o)[0], "Bus arrivals at 83139");
        assert_eq!(o.draft(), "half typed");
    }

    #[tokio::test]
    async fn empty_arrival_board_renders_fallback_text() {
        let api = FakeApi {
            arrivals: Mutex::new(Some(Ok(json!({"arrivals": {"services": []}})))),
            ..Default::default()
        };
        let o = orchestrator(api, Err(GeolocationFailure::Unsupported));
        o.request_arrivals("83139").await;
        assert_eq!(texts(&o), vec![NO_BUSES_MESSAGE]);
    }

    #[tokio::test]
    async fn arrivals_network_failure_message() {
        let o = orchestrator(FakeApi::default(), Err(GeolocationFailure::Unsupported));
        o.request_arrivals("83139").await;
        assert_eq!(texts(&o), vec![ARRIVALS_FAILURE_MESSAGE]);
    }

    #[tokio::test]
    async fn transcript_watch_tracks_length() {
        let o = orchestrator(
            FakeApi::replying(vec![Ok(json!({"messages": [{"content": "a"}, {"content": "b"}]}))]),
            Err(GeolocationFailure::Unsupported),
        );
        let rx = o.subscribe_transcript();
        o.submit("x").await;
        assert_eq!(*rx.borrow(), 3);
        assert_eq!(o.messages_since(1).len(), 2);
    }
}
