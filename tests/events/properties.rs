//! Property tests for delivery order and once semantics.

use less_events::{EventManager, ListenerCollection};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

proptest! {
    #[test]
    fn notify_follows_subscription_order(count in 0usize..64) {
        let collection: ListenerCollection<()> = ListenerCollection::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..count {
            let log = Arc::clone(&log);
            collection.subscribe(move |_| log.lock().unwrap().push(i), false);
        }

        collection.notify(&());

        let expected: Vec<usize> = (0..count).collect();
        prop_assert_eq!(&*log.lock().unwrap(), &expected);
    }

    #[test]
    fn once_listeners_fire_at_most_once(
        flags in proptest::collection::vec(any::<bool>(), 1..32),
        rounds in 1usize..5,
    ) {
        let manager: EventManager<()> = EventManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (i, once) in flags.iter().copied().enumerate() {
            let log = Arc::clone(&log);
            manager.add_listener("e", move |_| log.lock().unwrap().push(i), once);
        }

        for _ in 0..rounds {
            manager.emit("e", &());
        }

        let log = log.lock().unwrap();
        for (i, once) in flags.iter().copied().enumerate() {
            let calls = log.iter().filter(|&&j| j == i).count();
            let expected = if once { 1 } else { rounds };
            prop_assert_eq!(calls, expected, "listener {} (once = {})", i, once);
        }
        // First round keeps subscription order, once-listeners included.
        let first_round: Vec<usize> = (0..flags.len()).collect();
        prop_assert_eq!(&log[..flags.len()], &first_round[..]);
    }

    #[test]
    fn removing_a_subset_leaves_the_rest_in_order(
        keep in proptest::collection::vec(any::<bool>(), 0..32),
    ) {
        let collection: ListenerCollection<()> = ListenerCollection::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tokens = Vec::new();
        for i in 0..keep.len() {
            let log = Arc::clone(&log);
            tokens.push(collection.subscribe(move |_| log.lock().unwrap().push(i), false));
        }
        for (token, kept) in tokens.into_iter().zip(keep.iter().copied()) {
            if !kept {
                token();
            }
        }

        collection.notify(&());

        let expected: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, kept)| **kept)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(&*log.lock().unwrap(), &expected);
        prop_assert_eq!(collection.size(), expected.len());
    }
}
