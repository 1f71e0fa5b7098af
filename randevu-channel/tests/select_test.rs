use randevu_channel::{after, never, recv_from, select, send_to, Channel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_select_picks_the_ready_case() {
    let a = Channel::new();
    let b: Channel<i32> = Channel::new();
    let producer = a.clone();
    let t = thread::spawn(move || producer.send(10));

    let seen = Arc::new(Mutex::new(None));
    let got_a = seen.clone();
    let got_b = seen.clone();
    select(vec![
        recv_from(&a, move |v| *got_a.lock().unwrap() = Some(("a", v))),
        recv_from(&b, move |v| *got_b.lock().unwrap() = Some(("b", v))),
    ]);

    t.join().unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(("a", 10)));
}

#[test]
fn test_select_send_case_delivers() {
    let ch = Channel::new();
    let consumer = ch.clone();
    let t = thread::spawn(move || consumer.recv());

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    select(vec![send_to(&ch, 7, move || {
        count.fetch_add(1, Ordering::SeqCst);
    })]);

    assert_eq!(t.join().unwrap(), 7);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_select_mixed_cases_exactly_one_fires() {
    // Two receive cases fed by producers, two send cases drained by
    // consumers, and one case that can never fire.
    let recv_chans: Vec<Channel<usize>> = (0..2).map(|_| Channel::new()).collect();
    let send_chans: Vec<Channel<usize>> = (0..2).map(|_| Channel::new()).collect();
    let idle = never::<usize>();

    let mut producers = Vec::new();
    for (i, ch) in recv_chans.iter().enumerate() {
        let tx = ch.clone();
        producers.push(thread::spawn(move || tx.send(i)));
    }
    let mut consumers = Vec::new();
    for ch in send_chans.iter() {
        let rx = ch.clone();
        consumers.push(thread::spawn(move || rx.recv()));
    }

    let fired = Arc::new(Mutex::new(Vec::new()));
    let mut cases = Vec::new();
    for (i, ch) in recv_chans.iter().enumerate() {
        let log = fired.clone();
        cases.push(recv_from(ch, move |v| log.lock().unwrap().push(("recv", i, v))));
    }
    for (i, ch) in send_chans.iter().enumerate() {
        let log = fired.clone();
        cases.push(send_to(ch, 100 + i, move || {
            log.lock().unwrap().push(("send", i, 100 + i))
        }));
    }
    cases.push(idle.recv_case(|_| panic!("the never channel fired")));
    select(cases);

    let log = fired.lock().unwrap().clone();
    assert_eq!(log.len(), 1);
    let (kind, index, value) = log[0];
    if kind == "recv" {
        assert_eq!(value, index);
    }

    // Pair off every peer the select did not choose, then check that each
    // consumer observed the value meant for it.
    for (i, ch) in recv_chans.iter().enumerate() {
        if !(kind == "recv" && index == i) {
            assert_eq!(ch.recv(), i);
        }
    }
    for (i, ch) in send_chans.iter().enumerate() {
        if !(kind == "send" && index == i) {
            ch.send(100 + i);
        }
    }
    for p in producers {
        p.join().unwrap();
    }
    let got: Vec<usize> = consumers.into_iter().map(|c| c.join().unwrap()).collect();
    for (i, v) in got.iter().enumerate() {
        assert_eq!(*v, 100 + i);
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_weak_fairness() {
    const ROUNDS: usize = 200;
    let chans: Vec<Channel<usize>> = (0..3).map(|_| Channel::new()).collect();
    for (i, ch) in chans.iter().enumerate() {
        let tx = ch.clone();
        // Detached on purpose: parked in a rendezvous at process exit.
        randevu::spawn(move || loop {
            tx.send(i);
        });
    }

    let counts = Arc::new(Mutex::new([0usize; 3]));
    for _ in 0..ROUNDS {
        let mut cases = Vec::new();
        for ch in chans.iter() {
            let counts = counts.clone();
            cases.push(recv_from(ch, move |v: usize| {
                counts.lock().unwrap()[v] += 1;
            }));
        }
        select(cases);
    }

    let counts = *counts.lock().unwrap();
    assert_eq!(counts.iter().sum::<usize>(), ROUNDS);
    for (i, n) in counts.iter().enumerate() {
        assert!(*n > 2, "channel {i} was starved: {counts:?}");
    }
}

#[test]
fn test_cancelled_case_leaves_channel_clean() {
    let a = Channel::new();
    let b: Channel<i32> = Channel::new();
    let producer = a.clone();
    let t = thread::spawn(move || producer.send(1));

    let hit = Arc::new(AtomicUsize::new(0));
    let hit_a = hit.clone();
    select(vec![
        recv_from(&a, move |_| {
            hit_a.fetch_add(1, Ordering::SeqCst);
        }),
        recv_from(&b, |_| panic!("b never had a sender")),
    ]);
    t.join().unwrap();
    assert_eq!(hit.load(Ordering::SeqCst), 1);

    // The cancelled case must not have swallowed anything: a fresh value on
    // b goes to a plain receive.
    let late = b.clone();
    let t = thread::spawn(move || late.send(99));
    assert_eq!(b.recv(), 99);
    t.join().unwrap();
}

#[test]
fn test_select_loop_consumes_stream() {
    let ch = Channel::new();
    let tx = ch.clone();
    let t = thread::spawn(move || {
        for i in 0..100 {
            tx.send(i);
        }
    });

    let sum = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        let sum = sum.clone();
        select(vec![recv_from(&ch, move |v: usize| {
            sum.fetch_add(v, Ordering::SeqCst);
        })]);
    }
    t.join().unwrap();
    assert_eq!(sum.load(Ordering::SeqCst), (0..100).sum());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_timeout_via_after() {
    let quiet: Channel<i32> = Channel::new();
    let timer = after(Duration::from_millis(50));

    let timed_out = Arc::new(AtomicUsize::new(0));
    let fired = timed_out.clone();
    select(vec![
        recv_from(&quiet, |_| panic!("nobody sends on quiet")),
        timer.recv_case(move |_| {
            fired.fetch_add(1, Ordering::SeqCst);
        }),
    ]);
    assert_eq!(timed_out.load(Ordering::SeqCst), 1);
}

#[test]
#[should_panic(expected = "select over an empty case set")]
fn test_empty_select_panics() {
    select(Vec::new());
}
