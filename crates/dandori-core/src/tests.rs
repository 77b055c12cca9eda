#[cfg(test)]
mod tests {
    use crate::decode::{parse_frame, EventDecoder};
    use crate::ports::*;
    use crate::store::ChatStore;
    use crate::turn::{run_chat_turn, ERROR_EVENT_FALLBACK, HISTORY_LIMIT};

    use dandori_types::message::{ChatMessage, Role};
    use dandori_types::tool::ToolStatus;
    use dandori_types::{ClientError, Result};

    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::pin::Pin;
    use std::rc::Rc;

    use async_trait::async_trait;
    use futures::Stream;

    // Simple single-threaded executor for async tests
    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::sync::Arc;
        use std::task::{Context, Poll, Wake, Waker};

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    fn frame(event: &str, data: &Value) -> String {
        format!("event: {}\ndata: {}\n\n", event, data)
    }

    fn chunk_stream(chunks: Vec<Result<String>>) -> Pin<Box<dyn Stream<Item = Result<String>>>> {
        Box::pin(futures::stream::iter(chunks))
    }

    // ─── Decoder Tests ───────────────────────────────────────

    #[test]
    fn test_parse_frame_basic() {
        let raw = parse_frame("event: text_delta\ndata: {\"delta\":\"Hi\"}").unwrap();
        assert_eq!(raw.event, "text_delta");
        assert_eq!(raw.data["delta"], "Hi");
    }

    #[test]
    fn test_parse_frame_concatenates_data_lines() {
        let raw = parse_frame("event: text_delta\ndata: {\"delta\":\ndata: \"Hi\"}").unwrap();
        assert_eq!(raw.data["delta"], "Hi");
    }

    #[test]
    fn test_parse_frame_without_event_name_is_dropped() {
        assert!(parse_frame("data: {\"delta\":\"Hi\"}").is_none());
    }

    #[test]
    fn test_parse_frame_without_payload_is_dropped() {
        assert!(parse_frame("event: text_delta").is_none());
        assert!(parse_frame("event: text_delta\ndata: ").is_none());
    }

    #[test]
    fn test_parse_frame_malformed_json_degrades_to_raw_string() {
        let raw = parse_frame("event: text_delta\ndata: not json at all").unwrap();
        assert_eq!(raw.data, Value::String("not json at all".to_string()));
    }

    #[test]
    fn test_decoder_yields_in_order() {
        let chunks = vec![Ok(frame("a", &json!({"n": 1})) + &frame("b", &json!({"n": 2})))];
        let mut decoder = EventDecoder::new(chunk_stream(chunks));
        block_on(async {
            let first = decoder.next_event().await.unwrap().unwrap();
            assert_eq!(first.event, "a");
            let second = decoder.next_event().await.unwrap().unwrap();
            assert_eq!(second.event, "b");
            assert!(decoder.next_event().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_decoder_reassembles_frames_across_chunks() {
        // Frame split mid-payload over three reads
        let chunks = vec![
            Ok("event: text_delta\nda".to_string()),
            Ok("ta: {\"delta\":\"Hel".to_string()),
            Ok("lo\"}\n\n".to_string()),
        ];
        let mut decoder = EventDecoder::new(chunk_stream(chunks));
        block_on(async {
            let raw = decoder.next_event().await.unwrap().unwrap();
            assert_eq!(raw.event, "text_delta");
            assert_eq!(raw.data["delta"], "Hello");
            assert!(decoder.next_event().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_decoder_drops_trailing_partial_frame() {
        let chunks = vec![Ok(frame("a", &json!(1)) + "event: b\ndata: {\"unterminated\"")];
        let mut decoder = EventDecoder::new(chunk_stream(chunks));
        block_on(async {
            assert_eq!(decoder.next_event().await.unwrap().unwrap().event, "a");
            assert!(decoder.next_event().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_decoder_skips_empty_frames() {
        let chunks = vec![Ok(format!(
            "\n\ndata: {{\"orphan\":1}}\n\n{}",
            frame("real", &json!({}))
        ))];
        let mut decoder = EventDecoder::new(chunk_stream(chunks));
        block_on(async {
            assert_eq!(decoder.next_event().await.unwrap().unwrap().event, "real");
            assert!(decoder.next_event().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_decoder_propagates_read_error() {
        let chunks = vec![
            Ok(frame("a", &json!(1))),
            Err(ClientError::Network("connection reset".to_string())),
        ];
        let mut decoder = EventDecoder::new(chunk_stream(chunks));
        block_on(async {
            assert!(decoder.next_event().await.unwrap().is_some());
            assert!(decoder.next_event().await.is_err());
        });
    }

    // ─── Store Tests ─────────────────────────────────────────

    #[test]
    fn test_store_push_message_assigns_id() {
        let mut store = ChatStore::new();
        let msg = store.push_message(ChatMessage::user("hi"));
        assert!(!msg.id.is_empty());
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].id, msg.id);
    }

    #[test]
    fn test_store_update_message_by_id() {
        let mut store = ChatStore::new();
        let msg = store.push_message(ChatMessage::streaming_placeholder());
        let updated = store.update_message(&msg.id, |m| m.content.push_str("chunk"));
        assert!(updated);
        assert_eq!(store.messages()[0].content, "chunk");
    }

    #[test]
    fn test_store_update_unknown_id_is_noop() {
        let mut store = ChatStore::new();
        store.push_message(ChatMessage::user("hi"));
        let before = store.revision();
        assert!(!store.update_message("gone", |m| m.content.clear()));
        assert_eq!(store.revision(), before);
        assert_eq!(store.messages()[0].content, "hi");
    }

    #[test]
    fn test_store_revision_bumps_on_mutation() {
        let mut store = ChatStore::new();
        let r0 = store.revision();
        store.push_message(ChatMessage::user("hi"));
        let r1 = store.revision();
        assert_ne!(r0, r1);
        store.set_loading(true);
        assert_ne!(store.revision(), r1);
    }

    #[test]
    fn test_store_resolve_tool_event_completed() {
        let mut store = ChatStore::new();
        store.push_tool_event(dandori_types::tool::ToolEvent::running(
            Some("t1".to_string()),
            "search_courses",
            json!({}),
            "m1",
        ));
        assert!(store.resolve_tool_event("t1", json!({"courses": []})));
        assert_eq!(store.tool_events()[0].status, ToolStatus::Completed);
        assert!(store.tool_events()[0].result.is_some());
    }

    #[test]
    fn test_store_resolve_tool_event_error_marker() {
        let mut store = ChatStore::new();
        store.push_tool_event(dandori_types::tool::ToolEvent::running(
            Some("t1".to_string()),
            "search_courses",
            json!({}),
            "m1",
        ));
        assert!(store.resolve_tool_event("t1", json!({"error": "index offline"})));
        assert_eq!(store.tool_events()[0].status, ToolStatus::Error);
        assert_eq!(store.tool_events()[0].error.as_deref(), Some("index offline"));
    }

    #[test]
    fn test_store_tool_status_never_moves_backward() {
        let mut store = ChatStore::new();
        store.push_tool_event(dandori_types::tool::ToolEvent::running(
            Some("t1".to_string()),
            "search_courses",
            json!({}),
            "m1",
        ));
        assert!(store.resolve_tool_event("t1", json!({"courses": []})));
        // A second result for a settled event is a no-op
        assert!(!store.resolve_tool_event("t1", json!({"error": "late failure"})));
        assert_eq!(store.tool_events()[0].status, ToolStatus::Completed);
    }

    #[test]
    fn test_store_resolve_unknown_tool_is_noop() {
        let mut store = ChatStore::new();
        assert!(!store.resolve_tool_event("nope", json!({})));
        assert!(store.tool_events().is_empty());
    }

    #[test]
    fn test_store_artifact_dedup_first_wins() {
        let mut store = ChatStore::new();
        assert!(store.push_artifact(json!({"id": 5, "title": "Intro Pottery"})));
        assert!(!store.push_artifact(json!({"id": 5, "title": "Different Title"})));
        assert_eq!(store.artifacts().len(), 1);
        assert_eq!(store.artifacts()[0].course["title"], "Intro Pottery");
    }

    #[test]
    fn test_store_artifact_dedup_across_id_spellings() {
        let mut store = ChatStore::new();
        assert!(store.push_artifact(json!({"id": 5})));
        assert!(!store.push_artifact(json!({"course_id": 5})));
        assert_eq!(store.artifacts().len(), 1);
    }

    #[test]
    fn test_store_clear_messages_clears_artifacts_too() {
        let mut store = ChatStore::new();
        store.push_message(ChatMessage::user("hi"));
        store.push_artifact(json!({"id": 1}));
        store.clear_messages();
        assert!(store.messages().is_empty());
        assert!(store.artifacts().is_empty());
    }

    #[test]
    fn test_store_history_filters_and_bounds() {
        let mut store = ChatStore::new();
        for i in 0..12 {
            store.push_message(ChatMessage::user(format!("q{}", i)));
            store.push_message(ChatMessage::new(Role::Assistant, format!("a{}", i)));
        }
        let history = store.history(HISTORY_LIMIT);
        assert_eq!(history.len(), 10);
        // Most recent 10, in order
        assert_eq!(history[0].content, "q7");
        assert_eq!(history[9].content, "a11");
    }

    // ─── Scripted ChatPort ───────────────────────────────────

    struct ScriptedChat {
        chunks: Vec<Result<String>>,
        fallback: std::result::Result<ChatReply, ClientError>,
        requests: RefCell<Vec<ChatRequest>>,
        fallback_calls: RefCell<usize>,
    }

    impl ScriptedChat {
        fn new(chunks: Vec<Result<String>>) -> Self {
            Self {
                chunks,
                fallback: Err(ClientError::Other("fallback not scripted".to_string())),
                requests: RefCell::new(Vec::new()),
                fallback_calls: RefCell::new(0),
            }
        }

        fn with_fallback(mut self, reply: ChatReply) -> Self {
            self.fallback = Ok(reply);
            self
        }
    }

    #[async_trait(?Send)]
    impl ChatPort for ScriptedChat {
        fn stream_chat(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = Result<String>>>> {
            self.requests.borrow_mut().push(req);
            let chunks: Vec<Result<String>> = self
                .chunks
                .iter()
                .map(|c| match c {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(e.clone()),
                })
                .collect();
            Box::pin(futures::stream::iter(chunks))
        }

        async fn send_message(&self, req: ChatRequest) -> Result<ChatReply> {
            self.requests.borrow_mut().push(req);
            *self.fallback_calls.borrow_mut() += 1;
            match &self.fallback {
                Ok(reply) => Ok(reply.clone()),
                Err(e) => Err(e.clone()),
            }
        }
    }

    fn shared_store() -> Rc<RefCell<ChatStore>> {
        Rc::new(RefCell::new(ChatStore::new()))
    }

    fn assistant_message(store: &Rc<RefCell<ChatStore>>) -> ChatMessage {
        store
            .borrow()
            .messages()
            .iter()
            .find(|m| m.role == Role::Assistant)
            .cloned()
            .expect("no assistant message")
    }

    // ─── Turn Tests ──────────────────────────────────────────

    #[test]
    fn test_turn_concatenates_deltas() {
        let script = vec![Ok(frame("text_delta", &json!({"delta": "Hel"}))
            + &frame("text_delta", &json!({"delta": "lo"}))
            + &frame("text_delta", &json!({"delta": " there"}))
            + &frame("message_end", &json!({})))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        // message_end with no final text keeps the accumulated deltas
        assert_eq!(msg.content, "Hello there");
        assert!(!msg.is_streaming);
        assert!(!msg.is_error);
        assert_eq!(*api.fallback_calls.borrow(), 0);
    }

    #[test]
    fn test_turn_empty_final_message_keeps_deltas() {
        let script = vec![Ok(frame("text_delta", &json!({"delta": "Hello"}))
            + &frame("message_end", &json!({"message": ""})))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.is_streaming);
    }

    #[test]
    fn test_turn_message_end_overrides_accumulated_content() {
        let script = vec![Ok(frame("text_delta", &json!({"delta": "partial"}))
            + &frame(
                "message_end",
                &json!({"message": "Here you go", "mode": "standard", "model": "gpt-4o"}),
            ))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert_eq!(msg.content, "Here you go");
        let meta = msg.metadata.expect("metadata missing");
        assert_eq!(meta.mode.as_deref(), Some("standard"));
        assert_eq!(meta.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_turn_stops_at_terminal_event() {
        // Events after message_end must never be applied
        let script = vec![Ok(frame("message_end", &json!({"message": "Done"}))
            + &frame("text_delta", &json!({"delta": " EXTRA"}))
            + &frame("tool_call", &json!({"id": "late", "name": "x"})))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert_eq!(msg.content, "Done");
        assert!(!msg.is_streaming);
        assert!(store.borrow().tool_events().is_empty());
        assert_eq!(*api.fallback_calls.borrow(), 0);
    }

    #[test]
    fn test_turn_pottery_scenario() {
        let script = vec![Ok(frame(
            "tool_call",
            &json!({"id": "t1", "name": "search_courses", "arguments": {"query": "pottery"}}),
        ) + &frame(
            "tool_result",
            &json!({"id": "t1", "result": {"courses": [{"id": 5, "title": "Intro Pottery"}]}}),
        ) + &frame(
            "message_end",
            &json!({"message": "Here you go", "artifacts": [{"id": 5, "title": "Intro Pottery"}]}),
        ))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "pottery please", None));

        let msg = assistant_message(&store);
        assert_eq!(msg.content, "Here you go");
        assert!(!msg.is_streaming);

        let s = store.borrow();
        assert_eq!(s.tool_events().len(), 1);
        let tool = &s.tool_events()[0];
        assert_eq!(tool.id, "t1");
        assert_eq!(tool.status, ToolStatus::Completed);
        assert_eq!(tool.message_id, msg.id);

        assert_eq!(s.artifacts().len(), 1);
        assert_eq!(s.artifacts()[0].id, "5");
        assert!(!s.is_loading());
    }

    #[test]
    fn test_turn_tool_result_for_unknown_id_is_noop() {
        let script = vec![Ok(frame(
            "tool_result",
            &json!({"id": "ghost", "result": {"courses": []}}),
        ) + &frame("message_end", &json!({"message": "ok"})))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        assert!(store.borrow().tool_events().is_empty());
        assert_eq!(assistant_message(&store).content, "ok");
    }

    #[test]
    fn test_turn_error_event_first() {
        let script = vec![Ok(frame(
            "error",
            &json!({"id": "e1", "name": "search_courses", "error": "timeout"}),
        ) + &frame("text_delta", &json!({"delta": "never applied"})))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert!(msg.is_error);
        assert!(!msg.is_streaming);
        assert_eq!(msg.content, "timeout");

        let s = store.borrow();
        assert_eq!(s.tool_events().len(), 1);
        assert_eq!(s.tool_events()[0].id, "e1");
        assert_eq!(s.tool_events()[0].status, ToolStatus::Error);
        assert!(!s.is_loading());
        assert_eq!(*api.fallback_calls.borrow(), 0);
    }

    #[test]
    fn test_turn_error_event_without_text_uses_fallback_copy() {
        let script = vec![Ok(frame("error", &json!({"id": "e1"})))];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        assert_eq!(assistant_message(&store).content, ERROR_EVENT_FALLBACK);
    }

    #[test]
    fn test_turn_empty_stream_triggers_fallback() {
        let api = ScriptedChat::new(vec![]).with_fallback(ChatReply {
            message: "fallback text".to_string(),
            artifacts: vec![json!({"id": 7, "title": "Weekend Weaving"})],
        });
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert_eq!(msg.content, "fallback text");
        assert!(!msg.is_streaming);
        assert!(!msg.is_error);
        assert_eq!(*api.fallback_calls.borrow(), 1);
        assert_eq!(store.borrow().artifacts().len(), 1);
        assert_eq!(store.borrow().artifacts()[0].id, "7");
    }

    #[test]
    fn test_turn_stream_without_terminal_uses_fallback() {
        let script = vec![Ok(frame("text_delta", &json!({"delta": "partial answer"})))];
        let api = ScriptedChat::new(script).with_fallback(ChatReply {
            message: "complete answer".to_string(),
            artifacts: vec![],
        });
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        // Fallback replaces the partial streamed content wholesale
        assert_eq!(assistant_message(&store).content, "complete answer");
    }

    #[test]
    fn test_turn_fallback_failure_becomes_error_message() {
        let api = ScriptedChat::new(vec![]);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert!(msg.is_error);
        assert!(!msg.is_streaming);
        assert!(!msg.content.is_empty());
        assert!(!store.borrow().is_loading());
    }

    #[test]
    fn test_turn_transport_error_becomes_error_message() {
        let script = vec![
            Ok(frame("text_delta", &json!({"delta": "so far"}))),
            Err(ClientError::Network("connection reset".to_string())),
        ];
        let api = ScriptedChat::new(script);
        let store = shared_store();

        block_on(run_chat_turn(&store, &api, "hi", None));

        let msg = assistant_message(&store);
        assert!(msg.is_error);
        assert!(!msg.is_streaming);
        assert!(msg.content.contains("connection reset"));
        assert!(!store.borrow().is_loading());
        // A transport failure mid-stream does not engage the fallback
        assert_eq!(*api.fallback_calls.borrow(), 0);
    }

    #[test]
    fn test_turn_history_bound_and_shape() {
        let store = shared_store();
        {
            let mut s = store.borrow_mut();
            for i in 0..12 {
                s.push_message(ChatMessage::user(format!("q{}", i)));
            }
        }
        let api = ScriptedChat::new(vec![Ok(frame("message_end", &json!({"message": "ok"})))]);

        block_on(run_chat_turn(&store, &api, "thirteenth", None));

        let requests = api.requests.borrow();
        assert_eq!(requests.len(), 1);
        let history = &requests[0].history;
        assert_eq!(history.len(), 10);
        // The submitted message is not part of its own history
        assert_eq!(history[9].content, "q11");
        assert_eq!(history[0].content, "q2");

        // Entries reduce to role + content, nothing else
        let entry = serde_json::to_value(&history[0]).unwrap();
        let keys: Vec<&String> = entry.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_turn_clears_previous_tool_events_and_artifacts() {
        let store = shared_store();
        {
            let mut s = store.borrow_mut();
            s.push_tool_event(dandori_types::tool::ToolEvent::running(
                Some("old".to_string()),
                "search_courses",
                json!({}),
                "old-msg",
            ));
            s.push_artifact(json!({"id": 99}));
        }
        let api = ScriptedChat::new(vec![Ok(frame("message_end", &json!({"message": "ok"})))]);

        block_on(run_chat_turn(&store, &api, "hi", None));

        let s = store.borrow();
        assert!(s.tool_events().is_empty());
        assert!(s.artifacts().is_empty());
    }

    #[test]
    fn test_turn_forwards_profile() {
        let api = ScriptedChat::new(vec![Ok(frame("message_end", &json!({"message": "ok"})))]);
        let store = shared_store();

        block_on(run_chat_turn(
            &store,
            &api,
            "hi",
            Some(json!({"name": "Ada"})),
        ));

        let requests = api.requests.borrow();
        assert_eq!(requests[0].profile.as_ref().unwrap()["name"], "Ada");
    }
}
