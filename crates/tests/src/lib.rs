//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 → 协调器 → 传输 的端到端测试（无需外部服务）
//! - 重试 / 超时 时序测试（暂停时钟）

#[cfg(test)]
mod contract_tests {
    use serde_json::json;
    use span_correlator::{flatten, TagValue};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_flatten_identity_document() {
        let tags = flatten(&json!({
            "headers": { "correlationId": "a", "traceId": "b" },
            "key": { "recordId": "c" }
        }));

        let keys: Vec<&str> = tags.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["headers.correlationId", "headers.traceId", "key.recordId"]
        );
        assert_eq!(tags["headers.correlationId"], TagValue::from("a"));
        assert_eq!(tags["headers.traceId"], TagValue::from("b"));
        assert_eq!(tags["key.recordId"], TagValue::from("c"));
    }

    #[test]
    fn test_identity_headers_shape() {
        let identity = identity::build_identity("order.created", None, None, None).unwrap();
        let headers = identity.headers();

        assert_eq!(headers["correlationId"].as_str().unwrap().len(), 32);
        assert_eq!(headers["traceId"].as_str().unwrap().len(), 32);
        assert_eq!(headers["type"], "order.created");
        assert_ne!(headers["correlationId"], headers["traceId"]);
    }
}

#[cfg(test)]
mod support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use contracts::{Batch, CoordError, LatencyProbe, Transport};

    /// Probe answering from a fixed table; unknown endpoints fail
    pub struct TableProbe(pub HashMap<String, Option<f64>>);

    impl TableProbe {
        pub fn uniform(endpoints: &[String], latency_ms: f64) -> Self {
            Self(
                endpoints
                    .iter()
                    .map(|e| (e.clone(), Some(latency_ms)))
                    .collect(),
            )
        }

        pub fn unreachable() -> Self {
            Self(HashMap::new())
        }
    }

    impl LatencyProbe for TableProbe {
        async fn probe(&self, endpoint: &str) -> Result<Duration, CoordError> {
            match self.0.get(endpoint).copied().flatten() {
                Some(ms) => Ok(Duration::from_secs_f64(ms / 1000.0)),
                None => Err(CoordError::probe(endpoint, "unreachable")),
            }
        }
    }

    /// Transport failing its first `failures` sends, or hanging forever
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub failures: AtomicU32,
        pub hang: bool,
        pub calls: AtomicU32,
        pub delivered: Mutex<Vec<Batch>>,
    }

    impl ScriptedTransport {
        pub fn failing(failures: u32) -> Self {
            Self {
                failures: AtomicU32::new(failures),
                ..Self::default()
            }
        }

        pub fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::default()
            }
        }

        pub fn delivered(&self) -> Vec<Batch> {
            self.delivered.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, batch: &Batch) -> Result<(), CoordError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(CoordError::transport("scripted", "connection reset"));
            }
            self.delivered.lock().unwrap().push(batch.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), CoordError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use batch_sizer::BatchSizer;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CoordError, CoordinatorConfig, Message, TransportConfig, TransportKind};
    use dispatcher::{create_transport, Coordinator, UnitOfWork};
    use resilience::ExecutionPolicy;
    use serde_json::Value;
    use span_correlator::{InMemoryTracer, SpanCorrelator, TagValue};
    use tokio::net::UdpSocket;
    use tokio::time::Instant;

    use crate::support::{ScriptedTransport, TableProbe};

    const CONFIG: &str = r#"
version = "V1"

[service]
name = "orders-producer"
message_system = "kafka"
group_id = "orders"

[probe]
endpoints = ["ref-a:443", "ref-b:443"]

[resilience]
max_attempts = 3
initial_delay_ms = 1000
timeout_ms = 30000
"#;

    fn load(content: &str) -> CoordinatorConfig {
        ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap()
    }

    fn messages(count: usize, size: usize) -> Vec<Message> {
        (0..count).map(|_| Message::new(vec![7u8; size])).collect()
    }

    fn coordinator<X>(
        config: &CoordinatorConfig,
        probe: TableProbe,
        tracer: InMemoryTracer,
        transport: X,
    ) -> Coordinator<TableProbe, InMemoryTracer, X>
    where
        X: contracts::Transport + Sync,
    {
        Coordinator::new(
            BatchSizer::from_config(probe, &config.probe, &config.sizing),
            SpanCorrelator::new(tracer, config.service.clone()),
            transport,
            ExecutionPolicy::from_config(&config.resilience),
        )
    }

    /// End-to-end: config → sizing → per-batch span → log transport
    #[tokio::test]
    async fn test_e2e_log_transport() {
        let config = load(CONFIG);
        let probe = TableProbe::uniform(&config.probe.endpoints, 20.0);
        let tracer = InMemoryTracer::new();
        let transport = create_transport(&config.transport).await.unwrap();
        let coordinator = coordinator(&config, probe, tracer.clone(), transport);

        // 120 × 1KB = 120KB → volume tier 50
        let report = coordinator
            .dispatch(UnitOfWork::new("order.created", messages(120, 1024)))
            .await
            .unwrap();

        let decision = report.decision.unwrap();
        assert_eq!(decision.size, 50);
        assert_eq!(decision.latency_ceiling, 100);
        assert!(!decision.latency_assumed);

        let sizes: Vec<usize> = report.batches.iter().map(|b| b.messages).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert!(report.is_complete());
        assert_eq!(report.delivered_messages(), 120);

        let spans = tracer.spans();
        assert_eq!(spans.len(), 3);
        for (span, outcome) in spans.iter().zip(&report.batches) {
            assert_eq!(span.request.context.trace_id, *report.identity.trace_id());
            assert_eq!(span.request.context.span_id, outcome.record_id);
            assert_eq!(
                span.request.attribute("messageSystem"),
                Some(&TagValue::from("kafka"))
            );
            assert_eq!(
                span.request.attribute("eventName"),
                Some(&TagValue::from("order.created"))
            );
            assert_eq!(
                span.request.attribute("headers.correlationId"),
                Some(&TagValue::from(report.identity.correlation_id().as_str()))
            );
            assert_eq!(span.outcome, Some(Ok(())));
        }

        // Every batch gets its own record key
        assert_ne!(report.batches[0].record_id, report.batches[1].record_id);

        let snapshot = coordinator.metrics().snapshot();
        assert_eq!(snapshot.batches_sent, 3);
        assert_eq!(snapshot.messages_delivered, 120);
    }

    /// End-to-end: datagrams on the wire carry the identity and record key
    #[tokio::test]
    async fn test_e2e_network_transport() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let mut config = load(CONFIG);
        config.transport = TransportConfig {
            name: "udp".to_string(),
            kind: TransportKind::Network,
            params: HashMap::from([("addr".to_string(), addr.to_string())]),
        };
        ConfigLoader::validate(&config).unwrap();

        let probe = TableProbe::uniform(&config.probe.endpoints, 20.0);
        let tracer = InMemoryTracer::new();
        let transport = create_transport(&config.transport).await.unwrap();
        let coordinator = coordinator(&config, probe, tracer.clone(), transport);

        // 12 × 16B → volume tier 10
        let report = coordinator
            .dispatch(
                UnitOfWork::new("order.created", messages(12, 16))
                    .with_correlation_id("corr-1")
                    .with_trace_id("0af7651916cd43dd8448eb211c80319c"),
            )
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.batches.len(), 2);

        let mut buf = vec![0u8; 65536];
        for outcome in &report.batches {
            let len = tokio::time::timeout(Duration::from_secs(5), receiver.recv(&mut buf))
                .await
                .unwrap()
                .unwrap();
            let wire: Value = serde_json::from_slice(&buf[..len]).unwrap();

            assert_eq!(wire["headers"]["correlationId"], "corr-1");
            assert_eq!(
                wire["headers"]["traceId"],
                "0af7651916cd43dd8448eb211c80319c"
            );
            assert_eq!(wire["headers"]["type"], "order.created");
            assert_eq!(wire["key"]["recordId"], outcome.record_id.as_str());
            assert_eq!(wire["sequence"], outcome.sequence);
            assert_eq!(
                wire["messages"].as_array().unwrap().len(),
                outcome.messages
            );
        }
    }

    /// Two failures then success: delays of 1s and 2s before the third attempt
    #[tokio::test(start_paused = true)]
    async fn test_retry_backoff_timing() {
        let config = load(CONFIG);
        let probe = TableProbe::uniform(&config.probe.endpoints, 20.0);
        let coordinator = coordinator(
            &config,
            probe,
            InMemoryTracer::new(),
            ScriptedTransport::failing(2),
        );

        let started = Instant::now();
        let report = coordinator
            .dispatch(UnitOfWork::new("order.created", messages(5, 64)))
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(report.is_complete());
        assert_eq!(report.batches[0].attempts, 3);
        assert!(elapsed >= Duration::from_millis(3000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(3100), "{elapsed:?}");
        assert_eq!(coordinator.transport().delivered().len(), 1);
    }

    /// Retries exhausted: the batch is reported failed, the span carries the error
    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_recorded() {
        let config = load(CONFIG);
        let probe = TableProbe::uniform(&config.probe.endpoints, 20.0);
        let tracer = InMemoryTracer::new();
        let coordinator = coordinator(
            &config,
            probe,
            tracer.clone(),
            ScriptedTransport::failing(u32::MAX),
        );

        let report = coordinator
            .dispatch(UnitOfWork::new("order.created", messages(5, 64)))
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failed_batches(), 1);
        assert_eq!(report.batches[0].attempts, 3);
        assert!(report.batches[0]
            .error
            .as_deref()
            .unwrap()
            .contains("connection reset"));

        let spans = tracer.spans();
        assert!(matches!(spans[0].outcome, Some(Err(_))));
    }

    /// A hanging transport is cut off by the overall deadline and not retried
    #[tokio::test(start_paused = true)]
    async fn test_overall_timeout() {
        let config = load(
            r#"
[probe]
endpoints = ["ref-a:443"]

[resilience]
max_attempts = 3
initial_delay_ms = 100
timeout_ms = 500
"#,
        );
        let probe = TableProbe::uniform(&config.probe.endpoints, 20.0);
        let coordinator = coordinator(
            &config,
            probe,
            InMemoryTracer::new(),
            ScriptedTransport::hanging(),
        );

        let started = Instant::now();
        let report = coordinator
            .dispatch(UnitOfWork::new("order.created", messages(3, 64)))
            .await
            .unwrap();

        assert_eq!(report.failed_batches(), 1);
        assert!(report.batches[0]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out after 500ms"));
        assert_eq!(coordinator.transport().calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(600));
    }

    /// Per-attempt deadlines: every hung attempt times out and is retried
    #[tokio::test(start_paused = true)]
    async fn test_per_attempt_timeout_retries() {
        let config = load(
            r#"
[probe]
endpoints = ["ref-a:443"]

[resilience]
max_attempts = 3
initial_delay_ms = 100
timeout_ms = 500
timeout_scope = "per_attempt"
"#,
        );
        let probe = TableProbe::uniform(&config.probe.endpoints, 20.0);
        let coordinator = coordinator(
            &config,
            probe,
            InMemoryTracer::new(),
            ScriptedTransport::hanging(),
        );

        let report = coordinator
            .dispatch(UnitOfWork::new("order.created", messages(3, 64)))
            .await
            .unwrap();

        assert_eq!(report.failed_batches(), 1);
        assert_eq!(report.batches[0].attempts, 3);
        assert_eq!(coordinator.transport().calls.load(Ordering::SeqCst), 3);
    }

    /// Every probe failing aborts the unit unless a fallback latency is set
    #[tokio::test]
    async fn test_probe_exhaustion_and_fallback() {
        let config = load(CONFIG);
        let coordinator_without = coordinator(
            &config,
            TableProbe::unreachable(),
            InMemoryTracer::new(),
            ScriptedTransport::default(),
        );
        let result = coordinator_without
            .dispatch(UnitOfWork::new("order.created", messages(5, 64)))
            .await;
        assert!(matches!(
            result,
            Err(CoordError::ProbeExhaustion { attempted: 2, .. })
        ));

        let config = load(&format!("{CONFIG}\n[sizing]\nfallback_latency_ms = 250.0\n"));
        let coordinator_with = coordinator(
            &config,
            TableProbe::unreachable(),
            InMemoryTracer::new(),
            ScriptedTransport::default(),
        );
        let report = coordinator_with
            .dispatch(UnitOfWork::new("order.created", messages(5, 64)))
            .await
            .unwrap();
        let decision = report.decision.unwrap();
        assert!(decision.latency_assumed);
        assert_eq!(decision.latency_ms, 250.0);
        assert!(report.is_complete());
    }

    /// No type anywhere: nothing is probed, traced or sent
    #[tokio::test]
    async fn test_missing_type_aborts() {
        let config = load(CONFIG);
        let tracer = InMemoryTracer::new();
        let coordinator = coordinator(
            &config,
            TableProbe::uniform(&config.probe.endpoints, 20.0),
            tracer.clone(),
            ScriptedTransport::default(),
        );

        let result = coordinator
            .dispatch(UnitOfWork::new("", messages(5, 64)))
            .await;

        assert!(matches!(result, Err(CoordError::MissingType)));
        assert!(tracer.spans().is_empty());
        assert_eq!(coordinator.transport().calls.load(Ordering::SeqCst), 0);
    }
}

#[cfg(test)]
mod correlation_tests {
    use contracts::{CoordError, Identity, ServiceConfig, Token};
    use serde_json::{json, Map};
    use span_correlator::{InMemoryTracer, SpanCorrelator, TagValue};

    #[test]
    fn test_empty_trace_id_opens_no_span() {
        let tracer = InMemoryTracer::new();
        let correlator = SpanCorrelator::new(tracer.clone(), ServiceConfig::default());
        let identity = Identity::try_new(
            Token::from("corr-1"),
            Token::from(""),
            "order.created",
            Map::new(),
        )
        .unwrap();
        let record_key = identity::build_record_key();

        let result =
            correlator.start_correlated_span("send", "order.created", &identity, &record_key, &json!({}));

        assert!(matches!(result, Err(CoordError::InvalidTraceContext { .. })));
        assert!(tracer.spans().is_empty());
    }

    #[test]
    fn test_unset_service_metadata_is_null() {
        let tracer = InMemoryTracer::new();
        let correlator = SpanCorrelator::new(tracer.clone(), ServiceConfig::default());
        let identity = identity::build_identity("order.created", None, None, None).unwrap();
        let record_key = identity::build_record_key();

        correlator
            .start_correlated_span("send", "order.created", &identity, &record_key, &json!({}))
            .unwrap();

        let spans = tracer.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].request.attribute("groupId"), Some(&TagValue::Null));
        assert_eq!(
            spans[0].request.context.span_id,
            *record_key.record_id()
        );
    }
}
