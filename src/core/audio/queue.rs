use std::collections::VecDeque;

/// FIFO of pending clips with an explicit "currently playing" slot.
///
/// At most one item is current. The queue only moves when [`advance`] is
/// called for the current item's terminal event; a new item starts
/// immediately only when nothing is current.
///
/// [`advance`]: AudioQueue::advance
#[derive(Debug)]
pub struct AudioQueue<T> {
    pending: VecDeque<T>,
    current: Option<T>,
}

impl<T> Default for AudioQueue<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
        }
    }
}

impl<T> AudioQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item. Returns true when the queue was idle and the item
    /// became current, in which case the caller starts it.
    pub fn enqueue(&mut self, item: T) -> bool {
        if self.current.is_none() {
            self.current = Some(item);
            true
        } else {
            self.pending.push_back(item);
            false
        }
    }

    /// The item currently playing.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Finish the current item and promote the next head.
    ///
    /// Returns the finished item so the caller can release it. After the call
    /// [`current`](AudioQueue::current) is the item to start, or `None` when
    /// the queue went idle.
    pub fn advance(&mut self) -> Option<T> {
        let finished = self.current.take();
        self.current = self.pending.pop_front();
        finished
    }

    /// True when nothing is playing.
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Number of items waiting behind the current one.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_item_starts_immediately() {
        let mut queue = AudioQueue::new();
        assert!(queue.is_idle());
        assert!(queue.enqueue(1));
        assert!(!queue.enqueue(2));
        assert_eq!(queue.current(), Some(&1));
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_advance_promotes_head() {
        let mut queue = AudioQueue::new();
        queue.enqueue("a");
        queue.enqueue("b");

        assert_eq!(queue.advance(), Some("a"));
        assert_eq!(queue.current(), Some(&"b"));
        assert_eq!(queue.advance(), Some("b"));
        assert!(queue.is_idle());
        assert_eq!(queue.advance(), None);
    }

    #[test]
    fn test_enqueue_after_idle_restarts() {
        let mut queue = AudioQueue::new();
        queue.enqueue(1);
        queue.advance();
        assert!(queue.enqueue(2));
        assert_eq!(queue.current(), Some(&2));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Enqueue,
        Advance,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Enqueue), Just(Op::Advance)]
    }

    proptest! {
        #[test]
        fn prop_fifo_and_single_finish(ops in proptest::collection::vec(op(), 0..64)) {
            let mut queue = AudioQueue::new();
            let mut next_id = 0u32;
            let mut finished = Vec::new();

            for op in ops {
                match op {
                    Op::Enqueue => {
                        queue.enqueue(next_id);
                        next_id += 1;
                    }
                    Op::Advance => {
                        if let Some(done) = queue.advance() {
                            finished.push(done);
                        }
                    }
                }
            }
            while let Some(done) = queue.advance() {
                finished.push(done);
            }

            // every item finishes exactly once, in arrival order
            let expected: Vec<u32> = (0..next_id).collect();
            prop_assert_eq!(finished, expected);
            prop_assert!(queue.is_idle());
        }
    }
}
