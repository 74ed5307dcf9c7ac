//! Mock LED or buzzer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{Result, traits::Indicator, types::DeviceInfo};

#[derive(Debug, Default)]
struct Shared {
    on: AtomicBool,
    switches: AtomicUsize,
}

/// On/off output whose level can be observed through [`IndicatorState`].
#[derive(Debug)]
pub struct MockIndicator {
    name: String,
    shared: Arc<Shared>,
}

impl MockIndicator {
    pub fn new(name: impl Into<String>) -> (Self, IndicatorState) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                name: name.into(),
                shared: Arc::clone(&shared),
            },
            IndicatorState { shared },
        )
    }
}

impl Indicator for MockIndicator {
    fn set(&mut self, on: bool) -> Result<()> {
        let was = self.shared.on.swap(on, Ordering::SeqCst);
        if was != on {
            self.shared.switches.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock Indicator")
    }
}

/// Read side of a [`MockIndicator`].
#[derive(Debug, Clone)]
pub struct IndicatorState {
    shared: Arc<Shared>,
}

impl IndicatorState {
    pub fn is_on(&self) -> bool {
        self.shared.on.load(Ordering::SeqCst)
    }

    /// Number of off/on level changes so far.
    pub fn switch_count(&self) -> usize {
        self.shared.switches.load(Ordering::SeqCst)
    }
}
