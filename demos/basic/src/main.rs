//! Basic ssv example
//!
//! Demonstrates the Ahead-ordered, Parallel, and paced styles.

use ssv::{gather, Ssv, SsvConfig, SsvState};

fn counting_task(values: Vec<i32>) -> Box<dyn FnMut() -> Option<i32> + Send> {
    let mut iter = values.into_iter();
    Box::new(move || iter.next())
}

fn main() {
    println!("=== ssv Basic Example ===\n");

    println!("Ahead-ordered merge of two tasks:");
    let ahead = Ssv::new_ahead(SsvState::default(), counting_task(vec![1, 2, 3]));
    ahead.enqueue(counting_task(vec![4, 5, 6])).unwrap();
    let values = gather(&ahead).expect("ahead computation failed");
    println!("  {values:?}\n");
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);

    println!("Parallel-unbounded fan-out:");
    let parallel = Ssv::new_parallel(SsvState::default());
    parallel.enqueue(counting_task(vec![10, 11])).unwrap();
    parallel.enqueue(counting_task(vec![20, 21])).unwrap();
    let mut values = gather(&parallel).expect("parallel computation failed");
    values.sort();
    println!("  {values:?}\n");
    assert_eq!(values, vec![10, 11, 20, 21]);

    println!("Paced mode targeting 1000 yields/s:");
    let paced_config = SsvConfig::new().stream_rate(1000).threads_high(4);
    paced_config.print();
    let paced = Ssv::new_ahead(SsvState::new(paced_config), counting_task((0..50).collect()));
    let values = gather(&paced).expect("paced computation failed");
    println!("  received {} values\n", values.len());
    assert_eq!(values.len(), 50);

    println!("=== Example Complete ===");
}
