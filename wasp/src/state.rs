//! Per-instance store state.

/// Data carried by each instance's wasmtime store.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Host-owned guest regions `(addr, size)`, released after each call.
    allocations: Vec<(i32, i32)>,
    /// Message the guest passed to `raise_error` during the current call.
    guest_error: Option<String>,
}

impl State {
    /// Records a region to release once the current call returns.
    ///
    /// A region already tracked is kept once, so a guest returning a
    /// pointer the host wrote is not freed twice.
    pub(crate) fn track(&mut self, addr: i32, size: i32) {
        if !self.allocations.iter().any(|&(a, _)| a == addr) {
            self.allocations.push((addr, size));
        }
    }

    /// Drains the tracked regions.
    pub(crate) fn take_allocations(&mut self) -> Vec<(i32, i32)> {
        std::mem::take(&mut self.allocations)
    }

    /// Records a guest-raised error. The first error of a call wins.
    pub(crate) fn raise(&mut self, message: String) {
        self.guest_error.get_or_insert(message);
    }

    pub(crate) const fn has_error(&self) -> bool {
        self.guest_error.is_some()
    }

    pub(crate) fn take_error(&mut self) -> Option<String> {
        self.guest_error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_is_deduplicated_by_address() {
        let mut state = State::default();
        state.track(1024, 8);
        state.track(2048, 4);
        state.track(1024, 8);
        assert_eq!(state.take_allocations(), [(1024, 8), (2048, 4)]);
        assert!(state.take_allocations().is_empty());
    }

    #[test]
    fn first_raised_error_is_kept() {
        let mut state = State::default();
        state.raise("first".into());
        state.raise("second".into());
        assert!(state.has_error());
        assert_eq!(state.take_error().as_deref(), Some("first"));
        assert_eq!(state.take_error(), None);
        assert!(!state.has_error());
    }
}
