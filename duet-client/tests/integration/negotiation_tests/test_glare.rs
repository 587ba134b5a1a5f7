use duet_client::{NegotiationState, NegotiatorOptions};
use duet_core::{CallError, ConnectionId, SdpType};

use crate::integration::{create_test_negotiator, init_tracing};
use crate::utils::TransportCall;

/// Two ids where the first is textually smaller, so it is the polite side.
fn ordered_ids() -> (ConnectionId, ConnectionId) {
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    if a.to_string() < b.to_string() {
        (a, b)
    } else {
        (b, a)
    }
}

#[tokio::test]
async fn test_simultaneous_offers_converge_to_one_answerer() {
    init_tracing();
    let (polite_id, impolite_id) = ordered_ids();

    let (mut polite, polite_transport, _pe) =
        create_test_negotiator("polite", NegotiatorOptions::default()).await;
    let (mut impolite, impolite_transport, _ie) =
        create_test_negotiator("impolite", NegotiatorOptions::default()).await;
    polite.set_local_id(polite_id);
    polite.set_remote_id(Some(impolite_id));
    impolite.set_local_id(impolite_id);
    impolite.set_remote_id(Some(polite_id));
    assert!(polite.is_polite());
    assert!(!impolite.is_polite());

    let polite_offer = polite.initiate().await.unwrap();
    let impolite_offer = impolite.initiate().await.unwrap();

    // Both offers cross on the wire.
    let ignored = impolite
        .handle_remote_offer(Some(&polite_offer.to_raw()))
        .await;
    let answer = polite
        .handle_remote_offer(Some(&impolite_offer.to_raw()))
        .await
        .unwrap();

    assert_eq!(ignored.unwrap_err(), CallError::AlreadyNegotiating);
    assert_eq!(impolite.state(), NegotiationState::HaveLocalOffer);
    assert_eq!(polite.state(), NegotiationState::Stable);

    impolite
        .handle_remote_answer(Some(&answer.to_raw()))
        .await
        .unwrap();
    assert_eq!(impolite.state(), NegotiationState::Stable);

    // The polite side rolled back onto a fresh transport.
    assert_eq!(polite.generation(), 2);
    assert!(polite_transport.calls_for(1).contains(&TransportCall::Close));
    assert_eq!(
        polite_transport.calls_for(2),
        vec![
            TransportCall::SetRemote(SdpType::Offer, impolite_offer.sdp().to_owned()),
            TransportCall::CreateAnswer,
            TransportCall::SetLocal(SdpType::Answer, answer.sdp().to_owned()),
        ]
    );
    assert_eq!(impolite.generation(), 1);
    assert!(
        impolite_transport
            .remote_descriptions()
            .iter()
            .all(|(t, _)| *t == SdpType::Answer)
    );
}

#[tokio::test]
async fn test_unknown_ids_defer() {
    let (mut negotiator, _transport, _events) =
        create_test_negotiator("A", NegotiatorOptions::default()).await;
    assert!(negotiator.is_polite());

    negotiator.initiate().await.unwrap();
    let offer = super::raw_description("offer", "v=0 remote");
    negotiator.handle_remote_offer(Some(&offer)).await.unwrap();

    assert_eq!(negotiator.state(), NegotiationState::Stable);
}

#[tokio::test]
async fn test_rollback_without_new_transport_keeps_local_offer() {
    let (mut negotiator, transport, _events) =
        create_test_negotiator("A", NegotiatorOptions::default()).await;
    let local_offer = negotiator.initiate().await.unwrap();

    transport.fail_creates(true);
    let remote_offer = super::raw_description("offer", "v=0 remote");
    let err = negotiator
        .handle_remote_offer(Some(&remote_offer))
        .await
        .unwrap_err();

    assert!(matches!(err, CallError::Transport(_)), "{err:?}");
    assert_eq!(negotiator.state(), NegotiationState::HaveLocalOffer);
    assert_eq!(negotiator.local_description(), Some(&local_offer));
    assert_eq!(negotiator.generation(), 1);
    assert!(!transport.calls_for(1).contains(&TransportCall::Close));

    // The untouched offer can still be answered.
    transport.fail_creates(false);
    let answer = super::raw_description("answer", "v=0 answer");
    negotiator.handle_remote_answer(Some(&answer)).await.unwrap();
    assert_eq!(negotiator.state(), NegotiationState::Stable);
}
