#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::models::{NewReservation, NewTable, ReservationStatus, ReservationUpdate, TableUpdate};
    use crate::changes::Resource;
    use crate::service::{BookingService, MAX_HOLD_TTL_SECONDS};
    use crate::slots::SlotStatus;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use reservo_common::{HoldFailure, ReservoError};
    use reservo_config::{BookingConfig, BookingFlow};
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    // 2024-06-01 12:00 in Bangkok.
    fn setup_with(config: BookingConfig) -> (BookingService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 5, 0, 0).unwrap()));
        let service = BookingService::new(config, clock.clone()).unwrap();
        (service, clock)
    }

    fn setup() -> (BookingService, Arc<ManualClock>) {
        setup_with(BookingConfig::default())
    }

    fn new_reservation(time: &str, table: Option<u32>, session: Option<&str>) -> NewReservation {
        NewReservation {
            guest_name: "Malee Srisuk".to_string(),
            guest_phone: "081-234-5678".to_string(),
            guest_email: Some("malee@example.com".to_string()),
            party_size: 4,
            reservation_date: "2024-06-01".to_string(),
            reservation_time: time.to_string(),
            table_number: table,
            special_requests: Some("window seat".to_string()),
            admin_notes: None,
            payment_slip_url: Some(String::new()),
            status: None,
            session_id: session.map(str::to_string),
        }
    }

    fn table(name: &str, capacity: u32) -> NewTable {
        NewTable {
            name: name.to_string(),
            capacity,
            shape: Default::default(),
            zone: None,
            x: 0.0,
            y: 0.0,
            width: 80.0,
            height: 80.0,
        }
    }

    fn status_of(service: &BookingService, time: &str, session: Option<&str>) -> (SlotStatus, bool) {
        let slot = service
            .list_slots(date(), session)
            .into_iter()
            .find(|s| s.time == time)
            .unwrap();
        (slot.status, slot.mine)
    }

    fn hold_failure(err: ReservoError) -> HoldFailure {
        match err {
            ReservoError::HoldError(failure) => failure,
            other => panic!("expected a hold failure, got {other:?}"),
        }
    }

    #[test]
    fn slots_before_now_read_booked() {
        let (service, _) = setup();
        assert_eq!(status_of(&service, "11:30", None).0, SlotStatus::Booked);
        assert_eq!(status_of(&service, "12:00", None).0, SlotStatus::Booked);
        assert_eq!(status_of(&service, "12:30", None).0, SlotStatus::Available);

        let err = service.hold_slot(date(), "11:30", "s1").unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::SlotInPast);
    }

    #[test]
    fn hold_is_visible_to_others_and_mine_to_owner() {
        let (service, _) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();

        assert_eq!(status_of(&service, "18:00", Some("s1")), (SlotStatus::Available, true));
        assert_eq!(status_of(&service, "18:00", Some("s2")), (SlotStatus::Held, false));
        assert_eq!(status_of(&service, "18:00", None), (SlotStatus::Held, false));
    }

    #[test]
    fn second_session_cannot_take_a_held_slot() {
        let (service, _) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();
        let err = service.hold_slot(date(), "18:00", "s2").unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::SlotHeld);
        assert_eq!(status_of(&service, "18:00", Some("s1")), (SlotStatus::Available, true));
    }

    #[test]
    fn release_then_other_session_can_hold() {
        let (service, _) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();
        assert!(service.release_slot(date(), "18:00", "s1").unwrap());
        assert!(service.hold_slot(date(), "18:00", "s2").is_ok());
        assert!(!service.release_slot(date(), "19:00", "s1").unwrap());
    }

    #[test]
    fn off_grid_times_are_unknown_slots() {
        let (service, _) = setup();
        let err = service.hold_slot(date(), "18:15", "s1").unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::UnknownSlot);
        let err = service.hold_slot(date(), "late", "s1").unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::UnknownSlot);
    }

    #[test]
    fn holds_expire_after_ttl_and_are_swept() {
        let (service, clock) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();
        clock.advance(Duration::seconds(299));
        assert_eq!(status_of(&service, "18:00", Some("s2")).0, SlotStatus::Held);

        clock.advance(Duration::seconds(1));
        assert_eq!(status_of(&service, "18:00", Some("s2")).0, SlotStatus::Available);
        assert_eq!(service.sweep_expired_holds(), 1);
        assert_eq!(service.active_holds(), 0);
    }

    #[test]
    fn booking_consumes_the_hold_and_books_the_slot() {
        let (service, _) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();

        let reservation = service
            .create_reservation(new_reservation("18:00", None, Some("s1")))
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.guest_phone, "0812345678");
        assert_eq!(reservation.payment_slip_url, None);
        assert!(reservation.booking_code.starts_with("RS"));
        assert_eq!(reservation.booking_code.len(), 8);

        assert_eq!(service.active_holds(), 0);
        for session in [Some("s1"), Some("s2"), None] {
            assert_eq!(status_of(&service, "18:00", session), (SlotStatus::Booked, false));
        }
        // 90 + 15 minutes blocked, so 19:30 is still taken and 19:45 is not on the grid.
        assert_eq!(status_of(&service, "19:30", None).0, SlotStatus::Booked);
        assert_eq!(status_of(&service, "20:00", None).0, SlotStatus::Available);
    }

    #[test]
    fn submit_without_the_hold_is_rejected() {
        let (service, _) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();

        let err = service
            .create_reservation(new_reservation("18:00", None, Some("s2")))
            .unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::SlotHeld);
        let err = service.create_reservation(new_reservation("18:00", None, None)).unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::SlotHeld);
        assert!(service.list_reservations(Some(date())).is_empty());
    }

    #[test]
    fn full_slot_rejects_submission() {
        let (service, _) = setup();
        service.create_reservation(new_reservation("18:00", None, None)).unwrap();
        let err = service.create_reservation(new_reservation("18:30", None, None)).unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::SlotBooked);
    }

    #[test]
    fn capacity_follows_table_count() {
        let (service, _) = setup();
        service.create_table(table("T1", 4)).unwrap();
        service.create_table(table("T2", 6)).unwrap();

        service.create_reservation(new_reservation("18:00", Some(1), None)).unwrap();
        assert_eq!(status_of(&service, "18:00", None).0, SlotStatus::Available);

        let err = service
            .create_reservation(new_reservation("18:30", Some(1), None))
            .unwrap_err();
        assert!(matches!(err, ReservoError::ConflictError(_)));

        service.create_reservation(new_reservation("18:30", Some(2), None)).unwrap();
        assert_eq!(status_of(&service, "18:30", None).0, SlotStatus::Booked);
        assert_eq!(status_of(&service, "20:30", None).0, SlotStatus::Available);
    }

    #[test]
    fn table_must_exist_and_fit_the_party() {
        let (service, _) = setup();
        service.create_table(table("T1", 2)).unwrap();
        assert!(matches!(
            service.create_reservation(new_reservation("18:00", Some(1), None)),
            Err(ReservoError::ValidationError(_))
        ));
        assert!(matches!(
            service.create_reservation(new_reservation("18:00", Some(9), None)),
            Err(ReservoError::ValidationError(_))
        ));
    }

    #[test]
    fn availability_can_use_either_flow() {
        let (service, _) = setup();
        service.create_table(table("T1", 4)).unwrap();
        service.create_table(table("T2", 4)).unwrap();
        service.create_reservation(new_reservation("18:00", Some(1), None)).unwrap();

        let wizard = service.table_availability(date(), "19:50", Some(BookingFlow::Wizard)).unwrap();
        assert!(wizard.iter().all(|t| !t.booked));

        let form = service.table_availability(date(), "19:50", Some(BookingFlow::Form)).unwrap();
        assert!(form.iter().any(|t| t.table.id == 1 && t.booked));
        assert!(form.iter().any(|t| t.table.id == 2 && !t.booked));

        assert!(service.table_availability(date(), "7pm", None).is_err());
    }

    #[test]
    fn status_transitions_are_enforced() {
        let (service, _) = setup();
        let reservation = service.create_reservation(new_reservation("18:00", None, None)).unwrap();

        let update = |status| ReservationUpdate {
            status: Some(status),
            ..Default::default()
        };
        let confirmed = service
            .update_reservation(reservation.id, update(ReservationStatus::Confirmed))
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        let err = service
            .update_reservation(reservation.id, update(ReservationStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, ReservoError::ValidationError(_)));

        service
            .update_reservation(reservation.id, update(ReservationStatus::Cancelled))
            .unwrap();
        assert_eq!(status_of(&service, "18:00", None).0, SlotStatus::Available);
    }

    #[test]
    fn moving_onto_a_booked_table_conflicts() {
        let (service, _) = setup();
        service.create_table(table("T1", 4)).unwrap();
        service.create_table(table("T2", 4)).unwrap();
        service.create_reservation(new_reservation("18:00", Some(1), None)).unwrap();
        let second = service.create_reservation(new_reservation("18:30", Some(2), None)).unwrap();

        let err = service
            .update_reservation(
                second.id,
                ReservationUpdate {
                    table_number: Some(1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ReservoError::ConflictError(_)));

        let moved = service
            .update_reservation(
                second.id,
                ReservationUpdate {
                    reservation_time: Some("20:00".to_string()),
                    table_number: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.reservation_time, "20:00");
        assert_eq!(moved.table_number, Some(1));
    }

    #[test]
    fn edits_must_still_fit_the_table() {
        let (service, _) = setup();
        service.create_table(table("T1", 2)).unwrap();
        service.create_table(table("T2", 8)).unwrap();
        let booked = service.create_reservation(new_reservation("18:00", Some(2), None)).unwrap();

        let err = service
            .update_reservation(
                booked.id,
                ReservationUpdate {
                    table_number: Some(1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ReservoError::ValidationError(_)));

        let err = service
            .update_reservation(
                booked.id,
                ReservationUpdate {
                    party_size: Some(12),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ReservoError::ValidationError(_)));

        let grown = service
            .update_reservation(
                booked.id,
                ReservationUpdate {
                    party_size: Some(8),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!((grown.party_size, grown.table_number), (8, Some(2)));
    }

    #[test]
    fn moving_into_a_full_slot_is_rejected() {
        let (service, _) = setup();
        let early = service.create_reservation(new_reservation("18:00", None, None)).unwrap();
        let late = service.create_reservation(new_reservation("20:00", None, None)).unwrap();

        let err = service
            .update_reservation(
                late.id,
                ReservationUpdate {
                    reservation_time: Some("18:00".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(hold_failure(err), HoldFailure::SlotBooked);
        let at_six = service
            .list_reservations(Some(date()))
            .into_iter()
            .filter(|r| r.reservation_time == "18:00")
            .count();
        assert_eq!(at_six, 1);

        // Edits that keep the booking in place are not blocked by its own seat.
        service
            .update_reservation(
                early.id,
                ReservationUpdate {
                    admin_notes: Some("regular".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let moved = service
            .update_reservation(
                late.id,
                ReservationUpdate {
                    reservation_time: Some("20:30".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.reservation_time, "20:30");
    }

    #[tokio::test]
    async fn moving_a_booking_announces_both_slots() {
        let (service, _) = setup();
        let booked = service.create_reservation(new_reservation("18:00", None, None)).unwrap();
        let mut subscription = service.subscribe();

        service
            .update_reservation(
                booked.id,
                ReservationUpdate {
                    reservation_time: Some("20:30".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let mut slot_events = Vec::new();
        for _ in 0..3 {
            let event = subscription.next().await.unwrap();
            if event.resource == Resource::Timeslots {
                slot_events.push((event.id, event.date));
            }
        }
        assert_eq!(
            slot_events,
            vec![("20:30".to_string(), Some(date())), ("18:00".to_string(), Some(date()))]
        );
    }

    #[test]
    fn releasing_a_session_frees_all_its_slots() {
        let (service, _) = setup();
        service.hold_slot(date(), "18:00", "s1").unwrap();
        service.hold_slot(date(), "19:00", "s1").unwrap();
        service.hold_slot(date(), "20:00", "s2").unwrap();

        assert_eq!(service.release_session("s1"), 2);
        assert_eq!(status_of(&service, "18:00", Some("s2")).0, SlotStatus::Available);
        assert_eq!(status_of(&service, "20:00", Some("s1")).0, SlotStatus::Held);
        assert_eq!(service.active_holds(), 1);
        assert_eq!(service.release_session("s1"), 0);
    }

    #[test]
    fn lookup_by_code_and_phone() {
        let (service, _) = setup();
        let reservation = service.create_reservation(new_reservation("18:00", None, None)).unwrap();
        let code = reservation.booking_code.to_lowercase();

        assert_eq!(service.lookup_reservation(&code, None).unwrap().id, reservation.id);
        assert_eq!(
            service.lookup_reservation(&code, Some("081 234 5678")).unwrap().id,
            reservation.id
        );
        assert!(matches!(
            service.lookup_reservation(&code, Some("0899999999")),
            Err(ReservoError::NotFoundError(_))
        ));
    }

    #[test]
    fn delete_is_permanent() {
        let (service, _) = setup();
        let reservation = service.create_reservation(new_reservation("18:00", None, None)).unwrap();
        service.delete_reservation(reservation.id).unwrap();
        assert!(matches!(
            service.get_reservation(reservation.id),
            Err(ReservoError::NotFoundError(_))
        ));
        assert!(service.delete_reservation(reservation.id).is_err());
    }

    #[test]
    fn table_names_are_unique() {
        let (service, _) = setup();
        let t1 = service.create_table(table("Patio 1", 4)).unwrap();
        assert!(matches!(
            service.create_table(table("patio 1", 2)),
            Err(ReservoError::ConflictError(_))
        ));
        assert!(service.create_table(table("", 2)).is_err());
        assert!(service.create_table(table("Bar", 0)).is_err());

        let renamed = service
            .update_table(
                t1.id,
                TableUpdate {
                    name: Some("Patio A".to_string()),
                    x: Some(120.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Patio A");
        assert_eq!(renamed.x, 120.0);
        service.delete_table(t1.id).unwrap();
        assert!(service.list_tables().is_empty());
    }

    #[test]
    fn form_flow_blocks_more_slots() {
        let config = BookingConfig {
            conflict_flow: BookingFlow::Form,
            ..Default::default()
        };
        let (service, _) = setup_with(config);
        service.create_reservation(new_reservation("18:00", None, None)).unwrap();
        assert_eq!(status_of(&service, "19:30", None).0, SlotStatus::Booked);
        assert_eq!(status_of(&service, "20:00", None).0, SlotStatus::Available);
        assert_eq!(service.list_slots(date(), None)[0].label, "11:00-13:00");
    }

    #[tokio::test]
    async fn changes_are_published() {
        let (service, _) = setup();
        let mut subscription = service.subscribe();
        service.hold_slot(date(), "18:00", "s1").unwrap();
        let event = subscription.next().await.unwrap();
        assert_eq!(event.id, "18:00");
        assert_eq!(event.date, Some(date()));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = BookingConfig {
            time_zone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            BookingService::new(config, clock),
            Err(ReservoError::ConfigError(_))
        ));
    }

    #[test]
    fn hold_ttl_must_be_in_range() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        for ttl in [0, MAX_HOLD_TTL_SECONDS + 1, u64::MAX] {
            let config = BookingConfig {
                hold_ttl_seconds: ttl,
                ..Default::default()
            };
            assert!(
                matches!(BookingService::new(config, clock.clone()), Err(ReservoError::ConfigError(_))),
                "ttl {ttl} accepted"
            );
        }
        let config = BookingConfig {
            hold_ttl_seconds: MAX_HOLD_TTL_SECONDS,
            ..Default::default()
        };
        let service = BookingService::new(config, clock).unwrap();
        assert!(service.hold_slot(date() + Duration::days(3650), "18:00", "s1").is_ok());
    }
}
