//! Property tests: whatever order responses arrive in, a quiescent store
//! shows exactly what the server holds.

mod common;

use common::{booking, Call, ScriptedClient};
use proptest::prelude::*;
use resource_sync::{
    Booking, BookingPatch, BookingStatus, DataResult, ErrorInfo, RecordId, Resource,
    ResourceStore, SyncConfig, Timestamp,
};
use tokio::sync::oneshot;

const RECORDS: usize = 4;
const STATUSES: [BookingStatus; 4] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Cancelled,
    BookingStatus::Completed,
];

#[derive(Clone, Debug)]
enum Op {
    Update { record: usize, status: usize },
    Refresh,
    /// Answer one outstanding call; `fail` turns it into a network error.
    Respond { pick: usize, fail: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..RECORDS, 0..STATUSES.len()).prop_map(|(record, status)| Op::Update { record, status }),
        Just(Op::Refresh),
        (any::<usize>(), prop::bool::weighted(0.2)).prop_map(|(pick, fail)| Op::Respond { pick, fail }),
    ]
}

/// A call the server has received but not answered yet.
enum Outstanding {
    /// The list is computed when the call arrives and delivered later.
    List(Vec<Booking>, oneshot::Sender<DataResult<Vec<Booking>>>),
    Update(String, BookingPatch, oneshot::Sender<DataResult<Booking>>),
}

struct Server {
    records: Vec<Booking>,
    clock: i64,
}

impl Server {
    fn answer(&mut self, call: Outstanding, fail: bool) {
        match call {
            Outstanding::List(records, tx) => {
                let response = if fail {
                    DataResult::err(ErrorInfo::network("dropped"))
                } else {
                    DataResult::ok(records)
                };
                let _ = tx.send(response);
            }
            Outstanding::Update(_, _, tx) if fail => {
                let _ = tx.send(DataResult::err(ErrorInfo::network("dropped")));
            }
            Outstanding::Update(id, patch, tx) => {
                self.clock += 1;
                let record = self
                    .records
                    .iter_mut()
                    .find(|r| r.id.as_str() == id)
                    .expect("known record");
                record.apply_patch(&patch);
                record.touch(Timestamp(self.clock));
                let _ = tx.send(DataResult::ok(record.clone()));
            }
        }
    }
}

fn run(ops: Vec<Op>) -> (Vec<Booking>, Vec<Booking>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async move {
        let (client, mut calls) = ScriptedClient::<Booking>::new();
        let store = ResourceStore::new(client, SyncConfig::default());
        let mut server = Server {
            records: (0..RECORDS)
                .map(|i| booking(&format!("b-{}", i), BookingStatus::Pending, 0))
                .collect(),
            clock: 0,
        };

        let mut tasks = Vec::new();
        let mut outstanding = Vec::new();

        let initial = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh().await.map(|_| ()) })
        };
        match calls.recv().await.unwrap() {
            Call::List(tx) => server.answer(Outstanding::List(server.records.clone(), tx), false),
            other => panic!("unexpected {}", other.kind()),
        }
        initial.await.unwrap().unwrap();

        for op in ops {
            match op {
                Op::Update { record, status } => {
                    let store = store.clone();
                    let id: RecordId = format!("b-{}", record).into();
                    let patch = BookingPatch::status(STATUSES[status]);
                    tasks.push(tokio::spawn(async move {
                        store.update(&id, patch).await.map(|_| ())
                    }));
                }
                Op::Refresh => {
                    let store = store.clone();
                    tasks.push(tokio::spawn(async move { store.refresh().await.map(|_| ()) }));
                }
                Op::Respond { pick, fail } => {
                    if !outstanding.is_empty() {
                        let call = outstanding.remove(pick % outstanding.len());
                        server.answer(call, fail);
                        tokio::task::yield_now().await;
                    }
                    continue;
                }
            }
            // Every spawned operation makes exactly one call.
            match calls.recv().await.unwrap() {
                Call::List(tx) => outstanding.push(Outstanding::List(server.records.clone(), tx)),
                Call::Update(id, patch, tx) => {
                    outstanding.push(Outstanding::Update(id.as_str().to_string(), patch, tx))
                }
                other => panic!("unexpected {}", other.kind()),
            }
        }

        for call in outstanding.drain(..) {
            server.answer(call, false);
        }
        for task in tasks {
            let _ = task.await.unwrap();
        }

        (store.snapshot().records().to_vec(), server.records)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_quiescent_store_matches_server(ops in prop::collection::vec(op(), 0..40)) {
        let (shown, server) = run(ops);
        prop_assert_eq!(shown, server);
    }
}
