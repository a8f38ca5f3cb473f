//! Event-driven component capability shared by cells and the arbiter.
//!
//! A component sits in some state for `time_advance()` units of simulated time. When that
//! elapses it emits `output()` and takes an internal transition. Inputs arriving earlier cause an
//! external transition; inputs arriving exactly when the internal event is due cause a confluent
//! transition, which runs the internal transition first and then the external one with zero
//! elapsed time.

/// Passive components never self-trigger.
pub const PASSIVE: f64 = f64::INFINITY;

#[derive(Clone, Debug, PartialEq)]
pub enum Event<I> {
    Internal,
    External { elapsed: f64, inputs: Vec<I> },
    Confluent { inputs: Vec<I> },
}

pub trait Component {
    type Input;
    type Output;

    /// Time until the next internal event; [`PASSIVE`] when there is none.
    fn time_advance(&self) -> f64;

    /// Messages emitted just before the next internal transition. Does not change state.
    fn output(&self) -> Vec<Self::Output>;

    fn internal_transition(&mut self);

    fn external_transition(&mut self, elapsed: f64, inputs: Vec<Self::Input>);

    fn confluent_transition(&mut self, inputs: Vec<Self::Input>) {
        self.internal_transition();
        self.external_transition(0.0, inputs);
    }

    /// Apply `event` without collecting output.
    fn apply(&mut self, event: Event<Self::Input>) {
        match event {
            Event::Internal => self.internal_transition(),
            Event::External { elapsed, inputs } => self.external_transition(elapsed, inputs),
            Event::Confluent { inputs } => self.confluent_transition(inputs),
        }
    }

    /// Apply `event`, returning what the component emitted. Only internal and confluent events
    /// emit.
    fn transition(&mut self, event: Event<Self::Input>) -> Vec<Self::Output> {
        let emitted = match event {
            Event::External { .. } => Vec::new(),
            Event::Internal | Event::Confluent { .. } => self.output(),
        };
        self.apply(event);
        emitted
    }

    /// Run the pending internal event.
    fn fire(&mut self) -> Vec<Self::Output> {
        self.transition(Event::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts down twice then goes passive; records every input it sees.
    struct Countdown {
        remaining: u32,
        log: Vec<String>,
    }

    impl Component for Countdown {
        type Input = &'static str;
        type Output = u32;

        fn time_advance(&self) -> f64 {
            if self.remaining == 0 {
                PASSIVE
            } else {
                1.0
            }
        }

        fn output(&self) -> Vec<u32> {
            vec![self.remaining]
        }

        fn internal_transition(&mut self) {
            self.remaining -= 1;
            self.log.push(format!("internal {}", self.remaining));
        }

        fn external_transition(&mut self, elapsed: f64, inputs: Vec<&'static str>) {
            self.log.push(format!("external {elapsed} {}", inputs.join(",")));
        }
    }

    #[test]
    fn fire_emits_before_transition() {
        let mut c = Countdown {
            remaining: 2,
            log: Vec::new(),
        };
        assert_eq!(c.fire(), vec![2]);
        assert_eq!(c.fire(), vec![1]);
        assert_eq!(c.time_advance(), PASSIVE);
    }

    #[test]
    fn confluent_runs_internal_then_external_at_zero_elapsed() {
        let mut c = Countdown {
            remaining: 2,
            log: Vec::new(),
        };
        let out = c.transition(Event::Confluent { inputs: vec!["a"] });
        assert_eq!(out, vec![2]);
        assert_eq!(c.log, ["internal 1", "external 0 a"]);
    }

    #[test]
    fn external_event_emits_nothing() {
        let mut c = Countdown {
            remaining: 1,
            log: Vec::new(),
        };
        let out = c.transition(Event::External {
            elapsed: 0.5,
            inputs: vec!["x", "y"],
        });
        assert!(out.is_empty());
        assert_eq!(c.log, ["external 0.5 x,y"]);
    }
}
