//! Property-based tests for the dialog state machine

use super::*;
use crate::config::{Alias, DialogSettings, Locations, SavedPlace};
use crate::slot::fixtures::{custom, instant, message};
use crate::slot::{IntentMessage, ARRIVAL_TIME, LOCATION_FROM, LOCATION_TO};
use proptest::prelude::*;

fn context(retry_budget: u32) -> DialogContext {
    DialogContext::new(
        "prop-session",
        DialogSettings {
            retry_budget,
            ..DialogSettings::default()
        },
        Locations {
            current: "home".to_string(),
            home: SavedPlace::new("21 Onslow Gardens", "London"),
            work: SavedPlace::default(),
        },
    )
}

/// A turn that never clarifies anything
fn arb_unhelpful_turn() -> impl Strategy<Value = IntentMessage> {
    prop_oneof![
        (0.0f64..0.49).prop_map(|c| message("ElicitOrigin", vec![custom(LOCATION_FROM, "Onslow", c)])),
        Just(message("ElicitOrigin", vec![])),
        Just(message("GetWeather", vec![custom(LOCATION_FROM, "Soho", 0.99)])),
    ]
}

fn arb_place() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10})?"
}

fn arb_flow() -> impl Strategy<Value = Flow> {
    prop_oneof![
        Just(Flow::Directions),
        Just(Flow::NavigationTime),
        Just(Flow::DepartureTime),
        Just(Flow::ArrivalTime),
    ]
}

fn intent_name(flow: Flow) -> &'static str {
    match flow {
        Flow::Directions => "GetDirections",
        Flow::NavigationTime => "GetNavigationTime",
        Flow::DepartureTime => "GetDepartureTime",
        Flow::ArrivalTime => "GetArrivalTime",
    }
}

/// Feed `turns` after an opening message, returning the states visited and
/// every effect produced
fn run(ctx: &DialogContext, flow: Flow, opening: IntentMessage, turns: Vec<IntentMessage>) -> (Vec<DialogState>, Vec<Effect>) {
    let mut state = DialogState::Start;
    let mut states = Vec::new();
    let mut effects = Vec::new();
    let mut pending = vec![Event::Start { flow, message: opening }];
    let mut turns = turns.into_iter();

    loop {
        let Some(event) = pending.pop() else {
            if state.is_terminal() || matches!(state, DialogState::Routing { .. }) {
                break;
            }
            match turns.next().and_then(|m| Event::from_message(&state, m)) {
                Some(event) => {
                    pending.push(event);
                    continue;
                }
                None => break,
            }
        };
        let result = transition(&state, ctx, event).expect("valid transition");
        state = result.new_state;
        states.push(state.clone());
        effects.extend(result.effects);
    }
    (states, effects)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Unhelpful answers end the session within retry_budget + 1 turns
    #[test]
    fn prop_clarification_terminates(
        budget in 0u32..5,
        turns in proptest::collection::vec(arb_unhelpful_turn(), 0..10),
    ) {
        let ctx = context(budget);
        let opening = message(
            "GetDirections",
            vec![custom(LOCATION_TO, "Buckingham Palace", 0.9), custom(LOCATION_FROM, "Onslow", 0.1)],
        );
        let supplied = turns.len();

        let (states, _) = run(&ctx, Flow::Directions, opening, turns);

        prop_assert!(states.len() <= budget as usize + 1);
        let last = states.last().unwrap();
        if supplied >= budget as usize {
            prop_assert_eq!(
                last,
                &DialogState::Failed { reason: FailureReason::SlotsNotRecognized }
            );
        } else {
            prop_assert!(
                matches!(last, DialogState::AwaitingOrigin { .. }),
                "expected AwaitingOrigin, got {:?}",
                last
            );
        }
    }

    // A complete opening message produces exactly one route request
    #[test]
    fn prop_one_route_request(
        flow in arb_flow(),
        from in arb_place(),
        to in arb_place(),
        budget in 0u32..4,
    ) {
        prop_assume!(Alias::parse(&from).is_none() && Alias::parse(&to).is_none());
        prop_assume!(!from.to_lowercase().contains(&to.to_lowercase()));
        prop_assume!(!to.to_lowercase().contains(&from.to_lowercase()));
        let ctx = context(budget);
        let opening = message(
            intent_name(flow),
            vec![
                custom(LOCATION_FROM, &from, 0.9),
                custom(LOCATION_TO, &to, 0.9),
                instant(ARRIVAL_TIME, "2019-01-04 18:00:00 +00:00", 0.9),
                instant(crate::slot::DEPARTURE_TIME, "2019-01-04 17:00:00 +00:00", 0.9),
            ],
        );

        let (states, effects) = run(&ctx, flow, opening, vec![]);

        let requests = effects.iter().filter(|e| matches!(e, Effect::RequestRoute(_))).count();
        prop_assert_eq!(requests, 1);
        prop_assert!(
            matches!(states.last(), Some(DialogState::Routing { .. })),
            "expected Routing, got {:?}",
            states.last()
        );
    }

    // Identical ends never reach the backend
    #[test]
    fn prop_same_location_short_circuits(flow in arb_flow(), place in arb_place(), shout in any::<bool>()) {
        prop_assume!(Alias::parse(&place).is_none());
        let ctx = context(2);
        let to = if shout { place.to_uppercase() } else { place.clone() };
        let opening = message(
            intent_name(flow),
            vec![
                custom(LOCATION_FROM, &place, 0.9),
                custom(LOCATION_TO, &to, 0.9),
                instant(ARRIVAL_TIME, "2019-01-04 18:00:00 +00:00", 0.9),
                instant(crate::slot::DEPARTURE_TIME, "2019-01-04 17:00:00 +00:00", 0.9),
            ],
        );

        let (states, effects) = run(&ctx, flow, opening, vec![]);

        prop_assert_eq!(states.last(), Some(&DialogState::Resolved));
        prop_assert!(!effects.iter().any(|e| matches!(e, Effect::RequestRoute(_))));
        prop_assert!(effects.contains(&Effect::Say(Utterance::SameLocations)));
    }

    // Every terminal state ends with exactly one EndSession
    #[test]
    fn prop_terminal_states_end_the_session(
        budget in 0u32..4,
        turns in proptest::collection::vec(arb_unhelpful_turn(), 0..6),
        cancel in any::<bool>(),
    ) {
        let ctx = context(budget);
        let opening = message(
            "GetDirections",
            vec![custom(LOCATION_TO, "Soho", 0.9), custom(LOCATION_FROM, "Onslow", 0.1)],
        );
        let mut turns = turns;
        if cancel {
            turns.insert(0, message("Cancel", vec![]));
        }

        let (states, effects) = run(&ctx, Flow::Directions, opening, turns);
        let ended = effects.iter().filter(|e| matches!(e, Effect::EndSession)).count();

        if states.last().is_some_and(DialogState::is_terminal) {
            prop_assert_eq!(ended, 1);
        } else {
            prop_assert_eq!(ended, 0);
        }
    }
}
