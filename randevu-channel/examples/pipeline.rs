//! Fan-in over two typed sources with a select-based collector and a
//! timeout.

use randevu_channel::{after, recv_from, select, Channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn main() {
    let numbers = Channel::new();
    let words = Channel::new();

    for i in 0..3 {
        let tx = numbers.clone();
        randevu::spawn(move || tx.send(i * 10));
    }
    let tx = words.clone();
    randevu::spawn(move || tx.send("done"));

    // Drain whichever source is ready; stop once both fall silent.
    let mut collected = 0;
    loop {
        let timer = after(Duration::from_millis(200));
        let finished = Arc::new(Mutex::new(false));
        let flag = finished.clone();
        select(vec![
            recv_from(&numbers, |n| println!("number: {n}")),
            recv_from(&words, |w| println!("word: {w}")),
            timer.recv_case(move |_| *flag.lock().unwrap() = true),
        ]);
        if *finished.lock().unwrap() {
            break;
        }
        collected += 1;
    }
    println!("collected {collected} messages");
}
