use duet_client::{IceState, NegotiationState, NegotiatorOptions, TransportEvent};
use duet_core::{CallError, Candidate};

use super::{raw_candidate, raw_description};
use crate::integration::create_test_negotiator;

#[tokio::test]
async fn test_close_is_idempotent() {
    let (mut negotiator, transport, _events) =
        create_test_negotiator("A", NegotiatorOptions::default()).await;
    negotiator.initiate().await.unwrap();

    assert!(negotiator.close().await);
    assert!(!negotiator.close().await);

    assert_eq!(negotiator.state(), NegotiationState::Closed);
    assert_eq!(negotiator.ice_state(), IceState::Closed);
    assert_eq!(transport.close_count(), 1, "teardown must happen once");
}

#[tokio::test]
async fn test_close_from_idle() {
    let (mut negotiator, transport, _events) =
        create_test_negotiator("A", NegotiatorOptions::default()).await;

    assert!(negotiator.close().await);
    assert_eq!(transport.close_count(), 1);
}

#[tokio::test]
async fn test_handlers_after_close_do_nothing() {
    let (mut negotiator, transport, _events) =
        create_test_negotiator("A", NegotiatorOptions::default()).await;
    negotiator
        .handle_remote_candidate(Some(&raw_candidate(1)))
        .await
        .unwrap();
    negotiator.close().await;
    let calls_before = transport.calls().len();

    assert_eq!(negotiator.pending_candidates(), 0);
    assert_eq!(negotiator.initiate().await.unwrap_err(), CallError::Closed);

    let offer = raw_description("offer", "v=0 late offer");
    assert_eq!(
        negotiator.handle_remote_offer(Some(&offer)).await.unwrap_err(),
        CallError::Closed
    );
    let answer = raw_description("answer", "v=0 late answer");
    assert_eq!(
        negotiator.handle_remote_answer(Some(&answer)).await.unwrap_err(),
        CallError::Closed
    );
    assert_eq!(
        negotiator
            .handle_remote_candidate(Some(&raw_candidate(2)))
            .await
            .unwrap_err(),
        CallError::Closed
    );
    assert_eq!(negotiator.reset().await.unwrap_err(), CallError::Closed);

    let event = TransportEvent::LocalCandidate(1, Candidate::new("candidate:late"));
    assert_eq!(negotiator.on_transport_event(event), None);

    assert_eq!(transport.calls().len(), calls_before);
    assert_eq!(negotiator.state(), NegotiationState::Closed);
}
