//! Property tests for the universal invariants (spec §8 items 1-5): these
//! must hold after *every* reachable state, not just the scripted S1-S7
//! scenarios, so they are checked over randomized sequences of
//! create/confirm/expire calls rather than fixed scripts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use uuid::Uuid;

use booking::application::dtos::{ConfirmPaymentCommand, CreateHoldCommand, ExpireReservationCommand};
use booking::application::use_cases::ReservationCoordinator;
use booking::domain::entities::{Screening, Seat};
use booking::domain::value_objects::{ReservationStatus, ScreeningId, SeatId, SeatStatus};
use booking::test_support::{InMemoryBookingGateway, RecordingDelayScheduler, RecordingEventPublisher};
use booking::BookingConfig;

type TestCoordinator = ReservationCoordinator<InMemoryBookingGateway, RecordingDelayScheduler, RecordingEventPublisher>;

const SEAT_LABELS: [&str; 3] = ["P1", "P2", "P3"];
const BUYERS: [&str; 2] = ["u1", "u2"];
// Deliberately wider than the number of seats/reservations that can exist at
// once, so most indices land out of range and exercise the not-found paths.
const INDEX_SPAN: usize = 8;

#[derive(Debug, Clone)]
enum Action {
    Hold { seat: usize, buyer: usize },
    Confirm { reservation: usize, buyer: usize },
    Expire { reservation: usize },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0..SEAT_LABELS.len(), 0..BUYERS.len()).prop_map(|(seat, buyer)| Action::Hold { seat, buyer }),
        (0..INDEX_SPAN, 0..BUYERS.len()).prop_map(|(reservation, buyer)| Action::Confirm { reservation, buyer }),
        (0..INDEX_SPAN).prop_map(|reservation| Action::Expire { reservation }),
    ]
}

async fn seeded() -> (Arc<TestCoordinator>, Arc<InMemoryBookingGateway>, ScreeningId) {
    let gateway = Arc::new(InMemoryBookingGateway::new());
    let screening_id = ScreeningId::new();
    gateway
        .seed_screening(Screening::reconstitute(
            screening_id,
            "Arrival".to_string(),
            Utc::now(),
            1,
            dec!(9.50),
            true,
            Utc::now(),
            Utc::now(),
        ))
        .await;
    for label in SEAT_LABELS {
        gateway
            .seed_seat(Seat::reconstitute(
                SeatId::new(),
                screening_id,
                label.to_string(),
                "P".to_string(),
                SeatStatus::Available,
                Utc::now(),
                Utc::now(),
            ))
            .await;
    }
    let scheduler = Arc::new(RecordingDelayScheduler::new());
    let publisher = Arc::new(RecordingEventPublisher::new());
    // A short TTL means holds created early in a sequence are already past
    // their deadline by the time later Expire actions run, so the Expired
    // arm of the state machine actually gets exercised.
    let config = BookingConfig { reservation_ttl: std::time::Duration::from_millis(5), ..BookingConfig::default() };
    let coordinator = Arc::new(ReservationCoordinator::new(gateway.clone(), scheduler, publisher, &config));
    (coordinator, gateway, screening_id)
}

/// Asserts invariants 1-3 (seat/reservation/sale cross-consistency) and
/// invariant 5 (no two sales share a reservation id) against a snapshot of
/// the fake's current state.
async fn assert_cross_consistency(gateway: &InMemoryBookingGateway) {
    let seats = gateway.all_seats().await;
    let reservations = gateway.all_reservations().await;
    let sales = gateway.all_sales().await;

    let sale_reservation_ids: Vec<Uuid> = sales.iter().map(|s| s.reservation_id().into_uuid()).collect();
    let unique: HashSet<Uuid> = sale_reservation_ids.iter().copied().collect();
    assert_eq!(sale_reservation_ids.len(), unique.len(), "invariant 5 violated: two sales share a reservation id");

    for seat in &seats {
        let pending_for_seat: Vec<_> = reservations.iter().filter(|r| r.seat_id() == seat.id() && r.status() == ReservationStatus::Pending).collect();
        let confirmed_for_seat: Vec<_> = reservations.iter().filter(|r| r.seat_id() == seat.id() && r.status() == ReservationStatus::Confirmed).collect();

        match seat.status() {
            SeatStatus::Available => {
                assert!(pending_for_seat.is_empty(), "invariant 1 violated: available seat {} has a pending reservation", seat.label());
            }
            SeatStatus::Reserved => {
                assert_eq!(pending_for_seat.len(), 1, "invariant 2 violated: reserved seat {} has {} pending reservations", seat.label(), pending_for_seat.len());
            }
            SeatStatus::Sold => {
                assert_eq!(confirmed_for_seat.len(), 1, "invariant 3 violated: sold seat {} has {} confirmed reservations", seat.label(), confirmed_for_seat.len());
                let sale_count = sales.iter().filter(|s| s.reservation_id() == confirmed_for_seat[0].id()).count();
                assert_eq!(sale_count, 1, "invariant 3 violated: sold seat {} does not have exactly one sale", seat.label());
            }
        }
    }
}

/// Asserts invariant 4: reservation status never returns to `Pending` once
/// left, and a terminal status (`Confirmed`/`Expired`/`Cancelled`) never
/// changes again.
fn assert_monotonic_transition(history: &mut HashMap<Uuid, ReservationStatus>, id: Uuid, current: ReservationStatus) {
    if let Some(&previous) = history.get(&id) {
        let allowed = previous == current
            || (previous == ReservationStatus::Pending
                && matches!(current, ReservationStatus::Confirmed | ReservationStatus::Expired | ReservationStatus::Cancelled));
        assert!(allowed, "invariant 4 violated: reservation {id} went from {previous:?} to {current:?}");
    }
    history.insert(id, current);
}

async fn run_sequence(actions: Vec<Action>) {
    let (coordinator, gateway, screening_id) = seeded().await;
    let mut reservation_ids: Vec<Uuid> = Vec::new();
    let mut history: HashMap<Uuid, ReservationStatus> = HashMap::new();

    for action in actions {
        match action {
            Action::Hold { seat, buyer } => {
                let result = coordinator
                    .create_hold(CreateHoldCommand {
                        screening_id: screening_id.into_uuid(),
                        seat_labels: vec![SEAT_LABELS[seat].to_string()],
                        buyer_id: BUYERS[buyer].to_string(),
                    })
                    .await;
                if let Ok(views) = result {
                    for view in views {
                        reservation_ids.push(view.reservation_id);
                    }
                }
            }
            Action::Confirm { reservation, buyer } => {
                if reservation < reservation_ids.len() {
                    let reservation_id = reservation_ids[reservation];
                    let _ = coordinator
                        .confirm_payment(ConfirmPaymentCommand { reservation_id, buyer_id: BUYERS[buyer].to_string() })
                        .await;
                }
            }
            Action::Expire { reservation } => {
                if reservation < reservation_ids.len() {
                    let reservation_id = reservation_ids[reservation];
                    let _ = coordinator.expire_reservation(ExpireReservationCommand { reservation_id }).await;
                }
            }
        }

        assert_cross_consistency(&gateway).await;
        for r in gateway.all_reservations().await {
            assert_monotonic_transition(&mut history, r.id().into_uuid(), r.status());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn universal_invariants_hold_over_random_sequences(actions in proptest::collection::vec(action_strategy(), 0..40)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(run_sequence(actions));
    }
}
