//! Integration tests for events

#[cfg(test)]
mod tests {
    use vendr_events::*;

    struct Component {
        tx: Option<EventSender>,
    }

    impl EventEmitter for Component {
        fn event_sender(&self) -> Option<&EventSender> {
            self.tx.as_ref()
        }
    }

    #[tokio::test]
    async fn emitter_helpers_reach_the_channel() {
        let (tx, mut rx) = channel();
        let component = Component { tx: Some(tx) };

        component.emit_operation_started("update");
        component.emit_phase(InstallPhase::Aggregating);
        component.emit_operation_completed("update", true);
        drop(component);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            AppEvent::General(GeneralEvent::OperationStarted { ref operation }) if operation == "update"
        ));
        assert!(matches!(
            events[1],
            AppEvent::Install(InstallEvent::PhaseChanged {
                phase: InstallPhase::Aggregating
            })
        ));
        assert!(matches!(
            events[2],
            AppEvent::General(GeneralEvent::OperationCompleted { success: true, .. })
        ));
    }

    #[test]
    fn component_without_sender_is_silent() {
        let component = Component { tx: None };
        component.emit_warning("nobody listens");
    }

    #[test]
    fn levels_round_trip_through_tracing() {
        for level in [
            EventLevel::Trace,
            EventLevel::Debug,
            EventLevel::Info,
            EventLevel::Warn,
            EventLevel::Error,
        ] {
            assert_eq!(EventLevel::from(tracing::Level::from(level)), level);
        }
        let missing = AppEvent::Resolver(ResolverEvent::PackageMissing {
            package: "github.com/foo/bar".into(),
            destination: "/p/vendor/github.com/foo/bar".into(),
        });
        assert_eq!(EventLevel::from(missing.log_level()), EventLevel::Info);
    }

    #[test]
    fn failure_context_carries_user_facing_details() {
        let err = vendr_errors::Error::from(vendr_errors::InstallError::OperationTimeout {
            package: "github.com/foo/bar".into(),
            timeout_seconds: 30,
        });
        let ctx = FailureContext::from_error(&err);
        assert!(ctx.retryable);
        assert_eq!(ctx.code.as_deref(), Some("install.operation_timeout"));
        assert!(ctx.message.contains("30s"));
    }
}
