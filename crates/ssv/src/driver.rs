//! Top-level driver: drains an SSV to completion, aggregating `Stop`
//! events, and propagates the first worker error after cancelling
//! siblings (§4.9).

use ssv_core::{slog_error, ChildEvent, SsvResult};

use crate::ssv::Ssv;

/// Drive `ssv` to completion, calling `on_yield` for each value and
/// returning the first worker error encountered, if any. Once an error
/// surfaces, every remaining worker is cancelled and trailing `Stop`
/// events are drained before returning — no `Yield` is ever observed
/// after the error is raised.
fn drain<T: Send + 'static>(ssv: &Ssv<T>, mut on_yield: impl FnMut(T)) -> SsvResult<()> {
    loop {
        let events = ssv.read_output();
        if events.is_empty() && ssv.post_process() {
            return Ok(());
        }
        for event in events {
            match event {
                ChildEvent::Yield(v) => on_yield(v),
                ChildEvent::Stop(_, None) => {}
                ChildEvent::Stop(worker, Some(err)) => {
                    slog_error!("worker {worker} stopped with error: {err}");
                    ssv.cancel_all();
                    while !ssv.post_process() {
                        ssv.read_output();
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Run `ssv` to completion, collecting every yielded value in delivery
/// order. Callers build the root SSV with [`crate::SsvState::default`]
/// (or an explicit one-shot-free state) so `yield_limit` is unbounded, per
/// the root-SSV convention in §4.9.
pub fn gather<T: Send + 'static>(ssv: &Ssv<T>) -> SsvResult<Vec<T>> {
    let mut out = Vec::new();
    drain(ssv, |v| out.push(v))?;
    Ok(out)
}

/// Same as [`gather`] but discards yielded values — for computations run
/// for their side effects alone.
pub fn wait<T: Send + 'static>(ssv: &Ssv<T>) -> SsvResult<()> {
    drain(ssv, |_| {})
}
