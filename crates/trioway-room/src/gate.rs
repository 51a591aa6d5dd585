//! Counting rendezvous for trio formation.
//!
//! The gate itself never blocks. It only does the bookkeeping: who is
//! queued, and which generation of trio is currently forming. The room
//! owns the lock around it and the wait-set queued visitors park on.
//!
//! Every completed trio bumps the generation. A queued visitor remembers
//! the generation it joined and is free to go once the gate has moved
//! past it. Releasing "exactly the other two" then falls out of the
//! counting: at most two visitors can ever be queued on one generation.

use trioway_protocol::VisitorId;

/// Number of visitors admitted together.
pub const TRIO_SIZE: usize = 3;

/// Outcome of arriving at the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Arrival {
    /// Not enough visitors yet; wait until `generation` is released.
    Queued { generation: u64, waiting: usize },
    /// This arrival completed `generation`. `trio` lists all members,
    /// the completing visitor last.
    Completed {
        generation: u64,
        trio: Vec<VisitorId>,
    },
}

#[derive(Debug)]
pub(crate) struct TrioGate {
    queued: Vec<VisitorId>,
    generation: u64,
}

impl TrioGate {
    pub(crate) fn new() -> Self {
        Self {
            queued: Vec::with_capacity(TRIO_SIZE),
            generation: 0,
        }
    }

    /// Adds a visitor to the forming trio.
    pub(crate) fn arrive(&mut self, visitor: VisitorId) -> Arrival {
        self.queued.push(visitor);
        let generation = self.generation;

        if self.queued.len() < TRIO_SIZE {
            return Arrival::Queued {
                generation,
                waiting: self.queued.len(),
            };
        }

        let trio = std::mem::replace(&mut self.queued, Vec::with_capacity(TRIO_SIZE));
        self.generation += 1;
        Arrival::Completed { generation, trio }
    }

    /// Whether the trio formed at `generation` has been let in.
    pub(crate) fn has_released(&self, generation: u64) -> bool {
        self.generation > generation
    }

    /// Visitors queued for the forming trio.
    pub(crate) fn waiting(&self) -> usize {
        self.queued.len()
    }

    /// Number of trios released so far.
    pub(crate) fn released(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: u64) -> VisitorId {
        VisitorId(id)
    }

    #[test]
    fn test_first_two_arrivals_queue() {
        let mut gate = TrioGate::new();
        assert_eq!(
            gate.arrive(v(1)),
            Arrival::Queued {
                generation: 0,
                waiting: 1
            }
        );
        assert_eq!(
            gate.arrive(v(2)),
            Arrival::Queued {
                generation: 0,
                waiting: 2
            }
        );
        assert!(!gate.has_released(0));
    }

    #[test]
    fn test_third_arrival_completes_trio() {
        let mut gate = TrioGate::new();
        gate.arrive(v(1));
        gate.arrive(v(2));

        let arrival = gate.arrive(v(3));

        assert_eq!(
            arrival,
            Arrival::Completed {
                generation: 0,
                trio: vec![v(1), v(2), v(3)]
            }
        );
        assert!(gate.has_released(0));
        assert_eq!(gate.waiting(), 0);
        assert_eq!(gate.released(), 1);
    }

    #[test]
    fn test_fourth_arrival_starts_next_generation() {
        let mut gate = TrioGate::new();
        for id in 1..=3 {
            gate.arrive(v(id));
        }

        let arrival = gate.arrive(v(4));

        assert_eq!(
            arrival,
            Arrival::Queued {
                generation: 1,
                waiting: 1
            }
        );
        assert!(!gate.has_released(1));
    }

    #[test]
    fn test_waiting_never_reaches_trio_size() {
        let mut gate = TrioGate::new();
        for id in 0..30 {
            gate.arrive(v(id));
            assert!(gate.waiting() < TRIO_SIZE);
        }
        assert_eq!(gate.released(), 10);
    }
}
